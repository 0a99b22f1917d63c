//! Genre database operations

use crate::Result;
use sqlx::SqlitePool;

/// Insert a genre if it is not already known; existing rows are untouched
pub async fn create_if_not_exists(pool: &SqlitePool, id: i64, name: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO genres (id, name, created_at, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}
