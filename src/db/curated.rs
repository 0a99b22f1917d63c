//! Curated maker registry
//!
//! A manually-maintained allow-list of high-trust makers. Curation priority
//! is independent of the computed popularity score and determines processing
//! precedence in the maker sweep.

use crate::db::makers;
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Curated maker record
#[derive(Debug, Clone)]
pub struct CuratedMaker {
    pub id: i64,
    pub maker_id: i64,
    pub priority: i64,
    pub is_active: bool,
    pub description: Option<String>,
}

/// Options for registering a curated maker
#[derive(Debug, Clone, Default)]
pub struct CurateOptions {
    pub priority: i64,
    pub description: Option<String>,
}

/// Active curated makers, highest priority first, newest first within a
/// priority level
pub async fn find_active(pool: &SqlitePool) -> Result<Vec<CuratedMaker>> {
    let rows = sqlx::query(
        r#"
        SELECT id, maker_id, priority, is_active, description
        FROM curated_makers
        WHERE is_active = 1
        ORDER BY priority DESC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CuratedMaker {
            id: row.get("id"),
            maker_id: row.get("maker_id"),
            priority: row.get("priority"),
            is_active: row.get::<i64, _>("is_active") != 0,
            description: row.get("description"),
        })
        .collect())
}

/// Register a curated maker by exact maker name.
///
/// The maker must already have been ingested at least once; otherwise this
/// fails with `Error::NotFound`. Re-registering an already-curated maker is
/// a no-op, so seeding runs are safe to repeat.
pub async fn create_by_maker_name(
    pool: &SqlitePool,
    name: &str,
    options: &CurateOptions,
) -> Result<()> {
    let maker = makers::find_by_name(pool, name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("maker not found: {name}")))?;

    let existing = sqlx::query("SELECT id FROM curated_makers WHERE maker_id = ?")
        .bind(maker.id)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        info!(maker_id = maker.id, name = %name, "maker already curated, skipping");
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO curated_makers (maker_id, priority, is_active, description, created_at, updated_at)
        VALUES (?, ?, 1, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(maker.id)
    .bind(options.priority)
    .bind(&options.description)
    .execute(pool)
    .await?;

    info!(maker_id = maker.id, name = %name, priority = options.priority, "curated maker registered");
    Ok(())
}
