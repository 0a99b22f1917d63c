//! Low-price discovery procedure
//!
//! Two bounded windows: a popularity-sorted week filtered to items that are
//! both cheap and well-reviewed, and a recency-sorted three days filtered by
//! price alone. The second window failing does not undo the first.

use super::{base_request, persist_normalized, CatalogSource};
use crate::config::Config;
use crate::services::catalog_client::SortOrder;
use crate::services::normalizer::normalize_item;
use crate::time::{days_ago, Clock};
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Price ceiling (inclusive) for a "cheap" item
pub const PRICE_CEILING: i64 = 500;
/// Minimum review count (inclusive) for the popular window
pub const MIN_REVIEW_COUNT: i64 = 10;
/// Trailing window for the popularity-sorted fetch
pub const POPULAR_WINDOW_DAYS: u64 = 7;
/// Trailing window for the recency-sorted fetch
pub const FRESH_WINDOW_DAYS: u64 = 3;
/// Page size for both fetches
pub const DISCOVERY_HITS: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LowPriceReport {
    pub popular_persisted: usize,
    pub fresh_persisted: usize,
}

/// Run low-price discovery. Only the popular-window fetch is fatal.
pub async fn run<S: CatalogSource>(
    source: &S,
    pool: &SqlitePool,
    config: &Config,
    clock: &dyn Clock,
) -> Result<LowPriceReport> {
    let mut report = LowPriceReport::default();

    let mut popular = base_request(config, SortOrder::Rank, DISCOVERY_HITS);
    popular.gte_date = Some(days_ago(clock, POPULAR_WINDOW_DAYS));
    let items = source.search_items(&popular).await?;

    for item in &items {
        let normalized = match normalize_item(item) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "skipping popular-window item");
                continue;
            }
        };
        let reviewed_enough = normalized.work.review_count.unwrap_or(0) >= MIN_REVIEW_COUNT;
        if normalized.work.price <= PRICE_CEILING && reviewed_enough {
            match persist_normalized(pool, &normalized).await {
                Ok(()) => report.popular_persisted += 1,
                Err(e) => warn!(work_id = %normalized.work.id, error = %e, "persist failed"),
            }
        }
    }

    let mut fresh = base_request(config, SortOrder::Date, DISCOVERY_HITS);
    fresh.gte_date = Some(days_ago(clock, FRESH_WINDOW_DAYS));
    match source.search_items(&fresh).await {
        Ok(fresh_items) => {
            for item in &fresh_items {
                let normalized = match normalize_item(item) {
                    Ok(n) => n,
                    Err(e) => {
                        warn!(error = %e, "skipping fresh-window item");
                        continue;
                    }
                };
                if normalized.work.price <= PRICE_CEILING {
                    match persist_normalized(pool, &normalized).await {
                        Ok(()) => report.fresh_persisted += 1,
                        Err(e) => {
                            warn!(work_id = %normalized.work.id, error = %e, "persist failed")
                        }
                    }
                }
            }
        }
        Err(e) => {
            // Non-fatal: the popular window already landed
            warn!(error = %e, "fresh-window fetch failed");
        }
    }

    info!(
        popular = report.popular_persisted,
        fresh = report.fresh_persisted,
        "low-price discovery complete"
    );
    Ok(report)
}
