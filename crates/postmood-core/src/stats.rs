//! Aggregation of per-item sentiment into counts and percentages.

use serde::{Deserialize, Serialize};

use crate::types::{ResultSet, SentimentLabel};

/// Whole-number percentage per bucket.
///
/// Each bucket is rounded on its own, so the three values can sum to 99 or 101.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub distribution: Distribution,
    /// Mean confidence across all items, as a rounded percentage.
    pub avg_confidence: u32,
}

/// Computes label counts, percentages and mean confidence for a result set.
///
/// Items with an unrecognized label count toward `total` only. Returns `None`
/// for an empty set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_stats(results: &ResultSet) -> Option<AggregateStats> {
    let total = results.len();
    if total == 0 {
        return None;
    }

    let mut positive_count = 0;
    let mut negative_count = 0;
    let mut neutral_count = 0;
    let mut confidence_sum = 0.0_f64;

    for result in results {
        match result.label {
            SentimentLabel::Positive => positive_count += 1,
            SentimentLabel::Negative => negative_count += 1,
            SentimentLabel::Neutral => neutral_count += 1,
            SentimentLabel::Other(_) => {}
        }
        confidence_sum += result.confidence();
    }

    let denom = total as f64;

    Some(AggregateStats {
        total,
        positive_count,
        negative_count,
        neutral_count,
        distribution: Distribution {
            positive: rounded_percent(positive_count as f64 / denom),
            negative: rounded_percent(negative_count as f64 / denom),
            neutral: rounded_percent(neutral_count as f64 / denom),
        },
        avg_confidence: rounded_percent(confidence_sum / denom),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rounded_percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().max(0.0) as u32
}
