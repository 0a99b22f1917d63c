//! Maker score database operations
//!
//! `maker_scores` is a fully derived cache: rows are replaced wholesale on
//! every scoring run and are never the source of truth for ranking inputs.

use crate::Result;
use sqlx::{Row, SqlitePool};

/// Persisted score row, one per maker
#[derive(Debug, Clone)]
pub struct MakerScore {
    pub maker_id: i64,
    pub works_count: i64,
    pub avg_review_score: f64,
    pub avg_review_count: f64,
    pub score_variance: Option<f64>,
    pub total_score: f64,
    pub last_calculated_at: String,
}

/// Aggregated work statistics for one maker, the scoring formula's input
#[derive(Debug, Clone, PartialEq)]
pub struct MakerStats {
    pub works_count: i64,
    pub avg_review_score: f64,
    pub avg_review_count: f64,
    /// Population variance of review averages; `None` when the maker has no
    /// reviewed works
    pub score_variance: Option<f64>,
}

/// Replace a maker's score row
pub async fn create_or_update(pool: &SqlitePool, score: &MakerScore) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO maker_scores (
            maker_id, works_count, avg_review_score, avg_review_count,
            score_variance, total_score, last_calculated_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(maker_id) DO UPDATE SET
            works_count = excluded.works_count,
            avg_review_score = excluded.avg_review_score,
            avg_review_count = excluded.avg_review_count,
            score_variance = excluded.score_variance,
            total_score = excluded.total_score,
            last_calculated_at = excluded.last_calculated_at,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(score.maker_id)
    .bind(score.works_count)
    .bind(score.avg_review_score)
    .bind(score.avg_review_count)
    .bind(score.score_variance)
    .bind(score.total_score)
    .bind(&score.last_calculated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Scored makers ordered by descending total score
pub async fn find_top_scored(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<MakerScore>> {
    let rows = sqlx::query(
        r#"
        SELECT maker_id, works_count, avg_review_score, avg_review_count,
               score_variance, total_score, last_calculated_at
        FROM maker_scores
        ORDER BY total_score DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_score).collect())
}

fn row_to_score(row: sqlx::sqlite::SqliteRow) -> MakerScore {
    MakerScore {
        maker_id: row.get("maker_id"),
        works_count: row.get("works_count"),
        avg_review_score: row.get("avg_review_score"),
        avg_review_count: row.get("avg_review_count"),
        score_variance: row.get("score_variance"),
        total_score: row.get("total_score"),
        last_calculated_at: row.get("last_calculated_at"),
    }
}

/// Aggregate review statistics over one maker's persisted works.
///
/// Averages ignore works without review data; variance is the population
/// variance of the per-work review averages.
pub async fn get_maker_stats(pool: &SqlitePool, maker_id: i64) -> Result<MakerStats> {
    let rows = sqlx::query(
        r#"
        SELECT w.review_average, w.review_count
        FROM works w
        JOIN work_makers wm ON wm.work_id = w.id
        WHERE wm.maker_id = ?
        "#,
    )
    .bind(maker_id)
    .fetch_all(pool)
    .await?;

    let works_count = rows.len() as i64;

    let scores: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get::<Option<f64>, _>("review_average"))
        .collect();
    let counts: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get::<Option<i64>, _>("review_count"))
        .map(|c| c as f64)
        .collect();

    let avg_review_score = mean(&scores).unwrap_or(0.0);
    let avg_review_count = mean(&counts).unwrap_or(0.0);
    let score_variance = mean(&scores).map(|avg| {
        scores.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / scores.len() as f64
    });

    Ok(MakerStats {
        works_count,
        avg_review_score,
        avg_review_count,
        score_variance,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
