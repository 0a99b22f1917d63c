//! makerscope - catalog ingestion and maker scoring batch runner
//!
//! One invocation runs one thing to completion: a scheduled trigger, a named
//! job, a curated-maker registration, or a read of the current ranking.

use anyhow::Result;
use clap::{Parser, Subcommand};
use makerscope::config::Config;
use makerscope::db::curated::CurateOptions;
use makerscope::services::catalog_client::CatalogClient;
use makerscope::services::scoring::ScoringEngine;
use makerscope::time::SystemClock;
use makerscope::{db, scheduler};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "makerscope", about = "Catalog ingestion and maker scoring pipeline")]
struct Cli {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the procedure mapped to a cron trigger expression
    Trigger {
        /// Cron expression the tick fired under, e.g. "0 2 * * *"
        expression: String,
    },
    /// Run a named batch job directly
    Job {
        /// One of: ranking-sync, low-price-discovery, maker-sweep, score-all
        name: String,
    },
    /// Register a curated maker by exact name
    Curate {
        name: String,
        #[arg(long, default_value_t = 0)]
        priority: i64,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print the top scored makers
    Top {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let pool = db::init_database(&config.database_path).await?;
    let clock = SystemClock;

    match cli.command {
        Command::Trigger { expression } => {
            let client = CatalogClient::new(&config.api_id, &config.affiliate_id)?;
            scheduler::dispatch_trigger(&expression, &client, &pool, &config, &clock).await?;
        }
        Command::Job { name } => {
            let job = scheduler::Job::from_name(&name)
                .ok_or_else(|| anyhow::anyhow!("unknown job: {name}"))?;
            let client = CatalogClient::new(&config.api_id, &config.affiliate_id)?;
            scheduler::run_job(job, &client, &pool, &config, &clock).await?;
        }
        Command::Curate {
            name,
            priority,
            description,
        } => {
            let options = CurateOptions {
                priority,
                description,
            };
            db::curated::create_by_maker_name(&pool, &name, &options).await?;
        }
        Command::Top { limit } => {
            let engine = ScoringEngine::new(&pool, &clock);
            let top = engine.get_top_scored_makers(limit, 0).await?;
            for (rank, score) in top.iter().enumerate() {
                info!(
                    rank = rank + 1,
                    maker_id = score.maker_id,
                    total_score = score.total_score,
                    works = score.works_count,
                    "ranked maker"
                );
            }
        }
    }

    Ok(())
}
