//! Batch exploration procedures
//!
//! Each procedure fetches a bounded page from the catalog API, normalizes
//! and persists every item, and continues past per-item failures. Only the
//! primary page fetch is fatal to a run.

pub mod low_price;
pub mod maker_sweep;
pub mod ranking_sync;

use crate::config::Config;
use crate::db::{genres, makers, series, works};
use crate::services::catalog_client::{CatalogClient, ItemRequest, RawItem, SortOrder};
use crate::services::normalizer::{normalize_item, NormalizedItem};
use crate::Result;
use sqlx::SqlitePool;

/// Read side of the catalog API, abstracted so batch runs are testable
/// without a network
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn search_items(&self, request: &ItemRequest) -> Result<Vec<RawItem>>;
}

impl CatalogSource for CatalogClient {
    async fn search_items(&self, request: &ItemRequest) -> Result<Vec<RawItem>> {
        CatalogClient::search_items(self, request).await
    }
}

/// Request descriptor pre-filled from configuration
pub fn base_request(config: &Config, sort: SortOrder, hits: u32) -> ItemRequest {
    ItemRequest {
        site: config.site.clone(),
        service: config.service.clone(),
        floor: config.floor.clone(),
        sort,
        hits,
        filters: Vec::new(),
        gte_date: None,
    }
}

/// Normalize one raw item and persist it with its entity graph
pub async fn persist_item(pool: &SqlitePool, raw: &RawItem) -> Result<NormalizedItem> {
    let normalized = normalize_item(raw)?;
    persist_normalized(pool, &normalized).await?;
    Ok(normalized)
}

/// Persist an already-normalized item.
///
/// Write order is load-bearing: related entities first so the junction rows
/// inserted by the work upsert reference existing makers/genres/series.
pub async fn persist_normalized(pool: &SqlitePool, item: &NormalizedItem) -> Result<()> {
    for maker in &item.makers {
        makers::create_if_not_exists(pool, maker.id, &maker.name).await?;
    }
    for genre in &item.genres {
        genres::create_if_not_exists(pool, genre.id, &genre.name).await?;
    }
    for series_ref in &item.series {
        series::create_if_not_exists(pool, series_ref.id, &series_ref.name).await?;
    }

    let associations = works::WorkAssociations {
        maker_ids: item.makers.iter().map(|m| m.id).collect(),
        genre_ids: item.genres.iter().map(|g| g.id).collect(),
        series_ids: item.series.iter().map(|s| s.id).collect(),
        sample_small_urls: item.sample_small_urls.clone(),
        sample_large_urls: item.sample_large_urls.clone(),
    };

    works::create_or_update(pool, &item.work, &associations).await
}
