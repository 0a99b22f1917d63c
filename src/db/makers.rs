//! Maker database operations

use crate::Result;
use sqlx::{Row, SqlitePool};

/// Maker record (creator/circle), keyed by the upstream numeric id
#[derive(Debug, Clone)]
pub struct Maker {
    pub id: i64,
    pub name: String,
}

/// Maker paired with the number of works linked to it
#[derive(Debug, Clone)]
pub struct MakerWorkCount {
    pub id: i64,
    pub name: String,
    pub works_count: i64,
}

/// Insert a maker if it is not already known; existing rows are untouched
pub async fn create_if_not_exists(pool: &SqlitePool, id: i64, name: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO makers (id, name, created_at, updated_at)
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

/// Find a maker by exact name match
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Maker>> {
    let row = sqlx::query("SELECT id, name FROM makers WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| Maker {
        id: row.get("id"),
        name: row.get("name"),
    }))
}

/// Makers ordered by descending linked-work count
pub async fn find_popular(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<MakerWorkCount>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.name, COUNT(wm.work_id) AS works_count
        FROM makers m
        LEFT JOIN work_makers wm ON wm.maker_id = m.id
        GROUP BY m.id, m.name
        ORDER BY works_count DESC, m.id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| MakerWorkCount {
            id: row.get("id"),
            name: row.get("name"),
            works_count: row.get("works_count"),
        })
        .collect())
}

/// Total number of known makers
pub async fn count_makers(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM makers")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::initialize_schema(&pool)
            .await
            .expect("Schema initialization failed");
        pool
    }

    #[tokio::test]
    async fn test_create_if_not_exists_preserves_first_name() {
        let pool = memory_pool().await;

        create_if_not_exists(&pool, 42, "Circle A").await.unwrap();
        create_if_not_exists(&pool, 42, "Circle A (renamed)")
            .await
            .unwrap();

        let maker = find_by_name(&pool, "Circle A").await.unwrap().unwrap();
        assert_eq!(maker.id, 42);
        assert_eq!(count_makers(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let pool = memory_pool().await;
        create_if_not_exists(&pool, 1, "Circle A").await.unwrap();

        assert!(find_by_name(&pool, "Circle").await.unwrap().is_none());
        assert!(find_by_name(&pool, "Circle A").await.unwrap().is_some());
    }
}
