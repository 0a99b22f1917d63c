//! Work database operations
//!
//! A work is a single catalog listing, keyed by the upstream content id.
//! Identity fields (id, title, affiliate URL, release date) are written once;
//! later ingestions of the same id only touch the mutable subset.

use crate::Result;
use sqlx::{Row, SqlitePool};

/// Work record (one catalog listing)
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    pub id: String,
    pub title: String,
    pub volume: Option<i64>,
    pub review_count: Option<i64>,
    pub review_average: Option<f64>,
    pub affiliate_url: String,
    pub image_list_url: String,
    pub image_small_url: String,
    pub image_large_url: String,
    pub price: i64,
    pub list_price: i64,
    pub release_date: String,
}

/// Related-entity ids and gallery URLs persisted alongside a work
#[derive(Debug, Clone, Default)]
pub struct WorkAssociations {
    pub maker_ids: Vec<i64>,
    pub genre_ids: Vec<i64>,
    pub series_ids: Vec<i64>,
    pub sample_small_urls: Vec<String>,
    pub sample_large_urls: Vec<String>,
}

/// Insert or update a work and its association rows.
///
/// Write order: work, then junctions, then sample images. Callers must have
/// created the referenced makers/genres/series beforehand.
pub async fn create_or_update(
    pool: &SqlitePool,
    work: &Work,
    associations: &WorkAssociations,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO works (
            id, title, volume, review_count, review_average, affiliate_url,
            image_list_url, image_small_url, image_large_url, price, list_price,
            release_date, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            volume = excluded.volume,
            review_count = excluded.review_count,
            review_average = excluded.review_average,
            image_list_url = excluded.image_list_url,
            image_small_url = excluded.image_small_url,
            image_large_url = excluded.image_large_url,
            price = excluded.price,
            list_price = excluded.list_price,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&work.id)
    .bind(&work.title)
    .bind(work.volume)
    .bind(work.review_count)
    .bind(work.review_average)
    .bind(&work.affiliate_url)
    .bind(&work.image_list_url)
    .bind(&work.image_small_url)
    .bind(&work.image_large_url)
    .bind(work.price)
    .bind(work.list_price)
    .bind(&work.release_date)
    .execute(pool)
    .await?;

    link_related(pool, "work_makers", "maker_id", &work.id, &associations.maker_ids).await?;
    link_related(pool, "work_genres", "genre_id", &work.id, &associations.genre_ids).await?;
    link_related(pool, "work_series", "series_id", &work.id, &associations.series_ids).await?;

    insert_sample_images(pool, "sample_small_images", &work.id, &associations.sample_small_urls)
        .await?;
    insert_sample_images(pool, "sample_large_images", &work.id, &associations.sample_large_urls)
        .await?;

    Ok(())
}

/// Insert junction rows for one work; duplicate pairs are silently ignored
async fn link_related(
    pool: &SqlitePool,
    table: &str,
    id_column: &str,
    work_id: &str,
    related_ids: &[i64],
) -> Result<()> {
    for related_id in related_ids {
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} ({id_column}, work_id, created_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(work_id, {id_column}) DO NOTHING
            "#
        ))
        .bind(related_id)
        .bind(work_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Insert gallery rows keyed by (work_id, position); existing positions keep
/// their original URL (galleries are insert-only)
async fn insert_sample_images(
    pool: &SqlitePool,
    table: &str,
    work_id: &str,
    urls: &[String],
) -> Result<()> {
    for (position, url) in urls.iter().enumerate() {
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (work_id, position, url, created_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(work_id, position) DO NOTHING
            "#
        ))
        .bind(work_id)
        .bind(position as i64)
        .bind(url)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Load work by content id
pub async fn load_work(pool: &SqlitePool, id: &str) -> Result<Option<Work>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, volume, review_count, review_average, affiliate_url,
               image_list_url, image_small_url, image_large_url, price,
               list_price, release_date
        FROM works
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Work {
        id: row.get("id"),
        title: row.get("title"),
        volume: row.get("volume"),
        review_count: row.get("review_count"),
        review_average: row.get("review_average"),
        affiliate_url: row.get("affiliate_url"),
        image_list_url: row.get("image_list_url"),
        image_small_url: row.get("image_small_url"),
        image_large_url: row.get("image_large_url"),
        price: row.get("price"),
        list_price: row.get("list_price"),
        release_date: row.get("release_date"),
    }))
}

/// Total number of persisted works
pub async fn count_works(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM works")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_work(id: &str) -> Work {
        Work {
            id: id.to_string(),
            title: "Test Work".to_string(),
            volume: Some(24),
            review_count: Some(12),
            review_average: Some(4.5),
            affiliate_url: "https://example.com/aff".to_string(),
            image_list_url: "https://example.com/list.jpg".to_string(),
            image_small_url: "https://example.com/small.jpg".to_string(),
            image_large_url: "https://example.com/large.jpg".to_string(),
            price: 770,
            list_price: 1100,
            release_date: "2024-03-01".to_string(),
        }
    }

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
    async fn test_save_and_load_work() {
        let pool = memory_pool().await;

        let work = sample_work("d_100001");
        create_or_update(&pool, &work, &WorkAssociations::default())
            .await
            .expect("Failed to save work");

        let loaded = load_work(&pool, "d_100001")
            .await
            .expect("Failed to load work")
            .expect("Work not found");

        assert_eq!(loaded, work);
    }

    #[tokio::test]
    async fn test_reingest_updates_only_mutable_fields() {
        let pool = memory_pool().await;

        let work = sample_work("d_100002");
        create_or_update(&pool, &work, &WorkAssociations::default())
            .await
            .unwrap();

        let mut second = sample_work("d_100002");
        second.title = "Renamed".to_string();
        second.release_date = "2024-04-01".to_string();
        second.price = 550;
        second.review_count = Some(40);
        create_or_update(&pool, &second, &WorkAssociations::default())
            .await
            .unwrap();

        let loaded = load_work(&pool, "d_100002").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Test Work");
        assert_eq!(loaded.release_date, "2024-03-01");
        assert_eq!(loaded.price, 550);
        assert_eq!(loaded.review_count, Some(40));
    }

    #[tokio::test]
    async fn test_sample_gallery_is_insert_only() {
        let pool = memory_pool().await;

        let work = sample_work("d_100003");
        let first = WorkAssociations {
            sample_small_urls: vec!["a.jpg".into(), "b.jpg".into()],
            ..Default::default()
        };
        create_or_update(&pool, &work, &first).await.unwrap();

        let second = WorkAssociations {
            sample_small_urls: vec!["z.jpg".into()],
            ..Default::default()
        };
        create_or_update(&pool, &work, &second).await.unwrap();

        let row = sqlx::query(
            "SELECT url FROM sample_small_images WHERE work_id = ? AND position = 0",
        )
        .bind("d_100003")
        .fetch_one(&pool)
        .await
        .unwrap();
        let url: String = row.get("url");
        assert_eq!(url, "a.jpg");

        let count =
            sqlx::query("SELECT COUNT(*) AS n FROM sample_small_images WHERE work_id = ?")
                .bind("d_100003")
                .fetch_one(&pool)
                .await
                .unwrap();
        let n: i64 = count.get("n");
        assert_eq!(n, 2);
    }
}
