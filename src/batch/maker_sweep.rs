//! New-works-by-maker sweep
//!
//! Processes curated makers first (in priority order), then popularity-ranked
//! makers up to a cap, skipping any that are already curated. For each maker,
//! fetches their recent catalog and keeps works released on or after the
//! lookback cutoff. Per-maker failures are logged and the sweep continues.

use super::{base_request, persist_normalized, CatalogSource};
use crate::config::Config;
use crate::db::{curated, makers};
use crate::services::catalog_client::{ArticleFilter, SortOrder};
use crate::services::normalizer::normalize_item;
use crate::time::{date_cutoff, released_on_or_after, Clock};
use crate::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};

/// Default lookback for "new" works
pub const SWEEP_LOOKBACK_DAYS: u64 = 14;
/// Per-maker fetch size
pub const SWEEP_MAKER_HITS: u32 = 30;
/// How many popularity-ranked makers to sweep after the curated list
pub const POPULAR_MAKER_CAP: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakerSweepReport {
    /// Makers whose catalog fetch succeeded
    pub makers_processed: usize,
    /// Makers skipped after a fetch failure
    pub makers_failed: usize,
    pub works_persisted: usize,
}

/// Run the sweep. Reading the curated and popular maker lists is fatal;
/// everything per maker is isolated.
pub async fn run<S: CatalogSource>(
    source: &S,
    pool: &SqlitePool,
    config: &Config,
    clock: &dyn Clock,
) -> Result<MakerSweepReport> {
    let cutoff = date_cutoff(clock, SWEEP_LOOKBACK_DAYS);
    let mut report = MakerSweepReport::default();

    let curated_makers = curated::find_active(pool).await?;
    let curated_ids: HashSet<i64> = curated_makers.iter().map(|c| c.maker_id).collect();

    for curated_maker in &curated_makers {
        sweep_maker(source, pool, config, curated_maker.maker_id, &cutoff, &mut report).await;
    }

    let popular = makers::find_popular(pool, POPULAR_MAKER_CAP, 0).await?;
    for maker in &popular {
        // Already handled via the curated path
        if curated_ids.contains(&maker.id) {
            continue;
        }
        sweep_maker(source, pool, config, maker.id, &cutoff, &mut report).await;
    }

    info!(
        processed = report.makers_processed,
        failed = report.makers_failed,
        works = report.works_persisted,
        cutoff = %cutoff,
        "maker sweep complete"
    );
    Ok(report)
}

async fn sweep_maker<S: CatalogSource>(
    source: &S,
    pool: &SqlitePool,
    config: &Config,
    maker_id: i64,
    cutoff: &str,
    report: &mut MakerSweepReport,
) {
    let mut request = base_request(config, SortOrder::Date, SWEEP_MAKER_HITS);
    request.filters.push(ArticleFilter::maker(maker_id));

    let items = match source.search_items(&request).await {
        Ok(items) => items,
        Err(e) => {
            warn!(maker_id, error = %e, "maker fetch failed, skipping");
            report.makers_failed += 1;
            return;
        }
    };

    for item in &items {
        let normalized = match normalize_item(item) {
            Ok(n) => n,
            Err(e) => {
                warn!(maker_id, error = %e, "skipping maker item");
                continue;
            }
        };
        if !released_on_or_after(&normalized.work.release_date, cutoff) {
            continue;
        }
        match persist_normalized(pool, &normalized).await {
            Ok(()) => report.works_persisted += 1,
            Err(e) => {
                warn!(maker_id, work_id = %normalized.work.id, error = %e, "persist failed")
            }
        }
    }

    report.makers_processed += 1;
}
