//! Ranking sync procedure
//!
//! Pulls the current popularity ranking, persists every item, then backfills
//! the catalog of each distinct maker seen in the ranking page.

use super::{base_request, persist_item, CatalogSource};
use crate::config::Config;
use crate::services::catalog_client::{ArticleFilter, SortOrder};
use crate::Result;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Page size for the ranking fetch
pub const RANKING_HITS: u32 = 100;
/// Per-maker backfill fetch size
pub const MAKER_BACKFILL_HITS: u32 = 10;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingSyncReport {
    pub items_fetched: usize,
    pub items_persisted: usize,
    pub makers_backfilled: usize,
}

/// Run the ranking sync. The initial page fetch is fatal; everything after
/// it is isolated per item or per maker.
pub async fn run<S: CatalogSource>(
    source: &S,
    pool: &SqlitePool,
    config: &Config,
) -> Result<RankingSyncReport> {
    let request = base_request(config, SortOrder::Rank, RANKING_HITS);
    let items = source.search_items(&request).await?;

    let mut report = RankingSyncReport {
        items_fetched: items.len(),
        ..Default::default()
    };

    // Makers referenced across the page, deduplicated by id
    let mut seen_makers: BTreeMap<i64, String> = BTreeMap::new();

    for item in &items {
        match persist_item(pool, item).await {
            Ok(normalized) => {
                report.items_persisted += 1;
                for maker in normalized.makers {
                    seen_makers.entry(maker.id).or_insert(maker.name);
                }
            }
            Err(e) => {
                warn!(
                    content_id = item.content_id.as_deref().unwrap_or("<unknown>"),
                    error = %e,
                    "skipping ranked item"
                );
            }
        }
    }

    for (maker_id, maker_name) in &seen_makers {
        let mut backfill = base_request(config, SortOrder::Rank, MAKER_BACKFILL_HITS);
        backfill.filters.push(ArticleFilter::maker(*maker_id));

        match source.search_items(&backfill).await {
            Ok(maker_items) => {
                for item in &maker_items {
                    if let Err(e) = persist_item(pool, item).await {
                        warn!(
                            maker_id,
                            content_id = item.content_id.as_deref().unwrap_or("<unknown>"),
                            error = %e,
                            "skipping backfill item"
                        );
                    }
                }
                report.makers_backfilled += 1;
            }
            Err(e) => {
                warn!(maker_id, maker = %maker_name, error = %e, "maker backfill fetch failed");
            }
        }
    }

    info!(
        fetched = report.items_fetched,
        persisted = report.items_persisted,
        makers = report.makers_backfilled,
        "ranking sync complete"
    );
    Ok(report)
}
