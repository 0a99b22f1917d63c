//! Cron-trigger dispatch
//!
//! Each cron tick is one short-lived process invocation carrying the trigger
//! expression it fired under. The expression maps 1:1 to a batch procedure;
//! an unrecognized expression is logged and otherwise ignored.

use crate::batch::{low_price, maker_sweep, ranking_sync, CatalogSource};
use crate::config::Config;
use crate::services::scoring::ScoringEngine;
use crate::time::Clock;
use crate::Result;
use sqlx::SqlitePool;
use std::fmt;
use tracing::{error, info};

/// Page size for the scheduled full scoring run
const SCORE_RUN_LIMIT: i64 = 200;

/// Named batch procedures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    RankingSync,
    LowPriceDiscovery,
    MakerSweep,
    ScoreAll,
}

impl Job {
    pub fn name(self) -> &'static str {
        match self {
            Job::RankingSync => "ranking-sync",
            Job::LowPriceDiscovery => "low-price-discovery",
            Job::MakerSweep => "maker-sweep",
            Job::ScoreAll => "score-all",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ranking-sync" => Some(Job::RankingSync),
            "low-price-discovery" => Some(Job::LowPriceDiscovery),
            "maker-sweep" => Some(Job::MakerSweep),
            "score-all" => Some(Job::ScoreAll),
            _ => None,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed trigger table: cron expression → procedure
pub const TRIGGERS: &[(&str, Job)] = &[
    ("0 2 * * *", Job::RankingSync),
    ("30 3 * * *", Job::LowPriceDiscovery),
    ("0 4 * * *", Job::MakerSweep),
    ("0 5 * * *", Job::ScoreAll),
];

/// Look up the procedure for a trigger expression
pub fn job_for_trigger(expression: &str) -> Option<Job> {
    TRIGGERS
        .iter()
        .find(|(expr, _)| *expr == expression)
        .map(|(_, job)| *job)
}

/// Dispatch one cron tick. Unknown expressions log an error and no-op.
pub async fn dispatch_trigger<S: CatalogSource>(
    expression: &str,
    source: &S,
    pool: &SqlitePool,
    config: &Config,
    clock: &dyn Clock,
) -> Result<()> {
    match job_for_trigger(expression) {
        Some(job) => {
            info!(trigger = %expression, job = %job, "dispatching scheduled job");
            run_job(job, source, pool, config, clock).await
        }
        None => {
            error!(trigger = %expression, "unrecognized schedule trigger, ignoring");
            Ok(())
        }
    }
}

/// Run one named procedure to completion
pub async fn run_job<S: CatalogSource>(
    job: Job,
    source: &S,
    pool: &SqlitePool,
    config: &Config,
    clock: &dyn Clock,
) -> Result<()> {
    match job {
        Job::RankingSync => {
            ranking_sync::run(source, pool, config).await?;
        }
        Job::LowPriceDiscovery => {
            low_price::run(source, pool, config, clock).await?;
        }
        Job::MakerSweep => {
            maker_sweep::run(source, pool, config, clock).await?;
        }
        Job::ScoreAll => {
            ScoringEngine::new(pool, clock)
                .calculate_all_maker_scores(SCORE_RUN_LIMIT, 0)
                .await?;
        }
    }
    Ok(())
}
