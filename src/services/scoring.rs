//! Maker scoring engine
//!
//! Aggregates persisted work statistics per maker into a single weighted
//! score. Five independent terms, each capped on its own; the sum is never
//! clamped, so totals above 100 are possible and preserved (downstream
//! ranking is ordinal).

use crate::db::{makers, scores};
use crate::db::scores::{MakerScore, MakerStats};
use crate::time::Clock;
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Quality term weight: `(avg_review_score / 5) * 40`
const QUALITY_WEIGHT: f64 = 40.0;
/// Popularity term weight: `min(ln(avg_review_count + 1) / ln(100), 1) * 20`
const POPULARITY_WEIGHT: f64 = 20.0;
/// Volume term weight: `min(ln(works_count + 1) / ln(10), 1) * 15`
const VOLUME_WEIGHT: f64 = 15.0;
/// Consistency term weight: `max(0, 1 - variance / 2) * 15`
const CONSISTENCY_WEIGHT: f64 = 15.0;
/// Breakout bonus weight: `min(works_count / 10, 1) * 10`
const BREAKOUT_WEIGHT: f64 = 10.0;

/// Minimum works for the breakout bonus
const BREAKOUT_MIN_WORKS: i64 = 3;
/// Minimum average review score for the breakout bonus
const BREAKOUT_MIN_SCORE: f64 = 4.0;

/// Outcome of a full scoring run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRunSummary {
    pub processed_count: usize,
    pub error_count: usize,
    pub total_makers: i64,
}

/// Compute the weighted total score for one maker's aggregated statistics.
///
/// Rounded to 2 decimal places. The formula is reproduced exactly as the
/// ranking depends on it, including the absence of a global clamp.
pub fn compute_total_score(stats: &MakerStats) -> f64 {
    let mut score = 0.0;

    if stats.avg_review_score > 0.0 {
        score += (stats.avg_review_score / 5.0) * QUALITY_WEIGHT;
    }

    if stats.avg_review_count > 0.0 {
        let popularity = ((stats.avg_review_count + 1.0).ln() / 100f64.ln()).min(1.0);
        score += popularity * POPULARITY_WEIGHT;
    }

    if stats.works_count > 0 {
        let volume = ((stats.works_count as f64 + 1.0).ln() / 10f64.ln()).min(1.0);
        score += volume * VOLUME_WEIGHT;
    }

    if let Some(variance) = stats.score_variance {
        if stats.avg_review_score > 0.0 {
            score += (1.0 - variance / 2.0).max(0.0) * CONSISTENCY_WEIGHT;
        }
    }

    if stats.works_count >= BREAKOUT_MIN_WORKS && stats.avg_review_score >= BREAKOUT_MIN_SCORE {
        score += (stats.works_count as f64 / 10.0).min(1.0) * BREAKOUT_WEIGHT;
    }

    (score * 100.0).round() / 100.0
}

/// Scoring engine over the shared storage handle
pub struct ScoringEngine<'a> {
    db: &'a SqlitePool,
    clock: &'a dyn Clock,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(db: &'a SqlitePool, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Recompute and persist one maker's score
    pub async fn calculate_maker_score(&self, maker_id: i64) -> Result<MakerScore> {
        let stats = scores::get_maker_stats(self.db, maker_id).await?;
        let total_score = compute_total_score(&stats);

        let score = MakerScore {
            maker_id,
            works_count: stats.works_count,
            avg_review_score: stats.avg_review_score,
            avg_review_count: stats.avg_review_count,
            score_variance: stats.score_variance,
            total_score,
            last_calculated_at: self
                .clock
                .now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        };

        scores::create_or_update(self.db, &score).await?;
        Ok(score)
    }

    /// Recompute scores for one page of makers, ordered by descending raw
    /// work count. Individual failures are logged and counted, never fatal.
    pub async fn calculate_all_maker_scores(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<ScoreRunSummary> {
        let total_makers = makers::count_makers(self.db).await?;
        let page = makers::find_popular(self.db, limit, offset).await?;

        let mut processed_count = 0;
        let mut error_count = 0;

        for maker in &page {
            match self.calculate_maker_score(maker.id).await {
                Ok(score) => {
                    processed_count += 1;
                    tracing::debug!(
                        maker_id = maker.id,
                        total_score = score.total_score,
                        "maker score updated"
                    );
                }
                Err(e) => {
                    error_count += 1;
                    warn!(maker_id = maker.id, error = %e, "maker score calculation failed");
                }
            }
        }

        info!(
            processed = processed_count,
            errors = error_count,
            total_makers,
            "scoring run complete"
        );

        Ok(ScoreRunSummary {
            processed_count,
            error_count,
            total_makers,
        })
    }

    /// Read of the score table ordered by descending total score
    pub async fn get_top_scored_makers(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MakerScore>> {
        scores::find_top_scored(self.db, limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(
        works_count: i64,
        avg_review_score: f64,
        avg_review_count: f64,
        score_variance: Option<f64>,
    ) -> MakerStats {
        MakerStats {
            works_count,
            avg_review_score,
            avg_review_count,
            score_variance,
        }
    }

    #[test]
    fn test_empty_maker_scores_zero() {
        assert_eq!(compute_total_score(&stats(0, 0.0, 0.0, None)), 0.0);
    }

    #[test]
    fn test_reference_case() {
        // quality 33.6, popularity 14.91, volume 11.67, consistency 14.25,
        // breakout 5.0
        let total = compute_total_score(&stats(5, 4.2, 30.0, Some(0.1)));
        assert_eq!(total, 79.44);
    }

    #[test]
    fn test_all_terms_maxed_reach_100() {
        let total = compute_total_score(&stats(10, 5.0, 200.0, Some(0.0)));
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_no_global_clamp_above_100() {
        // The quality term has no per-term cap in code; an out-of-range
        // average pushes the sum past 100 and it must stay there.
        let total = compute_total_score(&stats(10, 6.0, 200.0, Some(0.0)));
        assert_eq!(total, 108.0);
    }

    #[test]
    fn test_consistency_requires_known_variance_and_reviews() {
        let without_variance = compute_total_score(&stats(5, 4.2, 30.0, None));
        let with_variance = compute_total_score(&stats(5, 4.2, 30.0, Some(0.0)));
        assert_eq!(with_variance - without_variance, 15.0);

        // Variance known but no review signal: consistency contributes 0
        let unreviewed = compute_total_score(&stats(5, 0.0, 0.0, Some(0.0)));
        let expected_volume = ((6f64).ln() / 10f64.ln()).min(1.0) * 15.0;
        assert_eq!(unreviewed, (expected_volume * 100.0).round() / 100.0);
    }

    #[test]
    fn test_high_variance_zeroes_consistency() {
        let noisy = compute_total_score(&stats(5, 4.2, 30.0, Some(2.0)));
        let none = compute_total_score(&stats(5, 4.2, 30.0, None));
        assert_eq!(noisy, none);
    }

    #[test]
    fn test_breakout_thresholds() {
        let without_bonus = |works: i64, avg: f64| -> f64 {
            let mut s = (avg / 5.0) * 40.0;
            s += (11f64.ln() / 100f64.ln()).min(1.0) * 20.0;
            s += ((works as f64 + 1.0).ln() / 10f64.ln()).min(1.0) * 15.0;
            s += 15.0; // variance 0, reviews present
            (s * 100.0).round() / 100.0
        };

        // 2 works: below the works threshold, no bonus
        let two = compute_total_score(&stats(2, 4.5, 10.0, Some(0.0)));
        assert_eq!(two, without_bonus(2, 4.5));

        // 3.9 average: below the score threshold, no bonus
        let low_avg = compute_total_score(&stats(5, 3.9, 10.0, Some(0.0)));
        assert_eq!(low_avg, without_bonus(5, 3.9));

        // 3 works at 4.0 qualifies: bonus is min(3/10, 1) * 10 = 3.0
        let qualifying = compute_total_score(&stats(3, 4.0, 10.0, Some(0.0)));
        assert_eq!(
            qualifying,
            ((without_bonus(3, 4.0) + 3.0) * 100.0).round() / 100.0
        );
    }

    #[test]
    fn test_monotonic_in_each_input() {
        let base = stats(5, 4.2, 30.0, Some(0.1));
        let score = compute_total_score(&base);

        let more_quality = compute_total_score(&stats(5, 4.4, 30.0, Some(0.1)));
        let more_reviews = compute_total_score(&stats(5, 4.2, 60.0, Some(0.1)));
        let more_works = compute_total_score(&stats(8, 4.2, 30.0, Some(0.1)));

        assert!(more_quality >= score);
        assert!(more_reviews >= score);
        assert!(more_works >= score);
    }

    #[test]
    fn test_bounds_for_sane_inputs() {
        for works in [0i64, 1, 3, 10, 100] {
            for avg in [0.0, 1.0, 2.5, 4.0, 5.0] {
                for reviews in [0.0, 1.0, 50.0, 1000.0] {
                    for variance in [None, Some(0.0), Some(0.5), Some(4.0)] {
                        let total =
                            compute_total_score(&stats(works, avg, reviews, variance));
                        assert!(
                            (0.0..=100.0).contains(&total),
                            "out of bounds: {total} for works={works} avg={avg} reviews={reviews} variance={variance:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let total = compute_total_score(&stats(1, 0.1, 0.0, None));
        // quality only: (0.1 / 5) * 40 = 0.8, plus volume ln(2)/ln(10)*15
        let volume = ((2f64).ln() / 10f64.ln()) * 15.0;
        let expected = ((0.8 + volume) * 100.0).round() / 100.0;
        assert_eq!(total, expected);
        assert_eq!((total * 100.0).round() / 100.0, total);
    }
}
