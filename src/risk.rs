//! Churn risk scoring
//!
//! Risk is an additive score: a base figure for the customer's tier, a
//! penalty per day since the last event, and a penalty (or bonus) for the
//! activity trend. Only the final sum is clamped into [0, 100].

use crate::types::{EngagementFeatures, EngagementTier, Trend};
use serde::{Deserialize, Serialize};

/// Risk added per day of recency
pub const RECENCY_PENALTY_PER_DAY: f64 = 0.5;

pub const MIN_RISK: f64 = 0.0;
pub const MAX_RISK: f64 = 100.0;

/// Base risk for an engagement tier
pub fn base_risk(tier: EngagementTier) -> f64 {
    match tier {
        EngagementTier::NeverActive => 95.0,
        EngagementTier::TriedOnce => 80.0,
        EngagementTier::Casual => 60.0,
        EngagementTier::Regular => 40.0,
        EngagementTier::Loyal => 20.0,
        EngagementTier::SuperCustomer => 10.0,
        EngagementTier::Unknown => 50.0,
    }
}

/// Risk adjustment for an activity trend
pub fn trend_penalty(trend: Trend) -> f64 {
    match trend {
        Trend::Decreasing => 15.0,
        Trend::Stable => 0.0,
        Trend::Increasing => -10.0,
        Trend::Inactive => 20.0,
        Trend::Unknown => 0.0,
    }
}

/// Individual contributions to one customer's risk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub base: f64,
    pub recency_penalty: f64,
    pub trend_penalty: f64,
    /// Sum of the components before clamping
    pub raw: f64,
    /// Final score in [0, 100]
    pub score: f64,
}

/// Churn risk scorer
pub struct RiskScorer;

impl RiskScorer {
    /// Score one customer
    pub fn score(features: &EngagementFeatures, tier: EngagementTier) -> f64 {
        Self::breakdown(features, tier).score
    }

    /// Score a feature table against its tier column
    pub fn score_all(features: &[EngagementFeatures], tiers: &[EngagementTier]) -> Vec<f64> {
        features
            .iter()
            .zip(tiers)
            .map(|(f, tier)| Self::score(f, *tier))
            .collect()
    }

    /// Score one customer, keeping each component
    pub fn breakdown(features: &EngagementFeatures, tier: EngagementTier) -> RiskBreakdown {
        let base = base_risk(tier);
        // Future-dated events give negative recency; left unguarded until the clamp
        let recency_penalty = features.recency_days as f64 * RECENCY_PENALTY_PER_DAY;
        let trend_penalty = trend_penalty(features.frequency_trend);
        let raw = base + recency_penalty + trend_penalty;

        RiskBreakdown {
            base,
            recency_penalty,
            trend_penalty,
            raw,
            score: raw.clamp(MIN_RISK, MAX_RISK),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NEVER_SEEN_RECENCY_DAYS;

    fn features(recency_days: i64, trend: Trend) -> EngagementFeatures {
        let mut f = EngagementFeatures::inactive("C1");
        f.recency_days = recency_days;
        f.frequency_trend = trend;
        f
    }

    #[test]
    fn test_components_add_up() {
        let b = RiskScorer::breakdown(&features(10, Trend::Decreasing), EngagementTier::Regular);
        assert_eq!(b.base, 40.0);
        assert_eq!(b.recency_penalty, 5.0);
        assert_eq!(b.trend_penalty, 15.0);
        assert_eq!(b.score, 60.0);
    }

    #[test]
    fn test_increasing_trend_lowers_risk() {
        let score = RiskScorer::score(&features(2, Trend::Increasing), EngagementTier::Loyal);
        assert_eq!(score, 11.0);
    }

    #[test]
    fn test_sentinel_recency_clamps_to_max() {
        let f = EngagementFeatures::without_activity_data("X");
        let b = RiskScorer::breakdown(&f, EngagementTier::NeverActive);
        assert_eq!(b.raw, 95.0 + NEVER_SEEN_RECENCY_DAYS as f64 * 0.5);
        assert_eq!(b.score, 100.0);
    }

    #[test]
    fn test_negative_recency_clamps_to_min() {
        let b = RiskScorer::breakdown(&features(-100, Trend::Increasing), EngagementTier::SuperCustomer);
        assert_eq!(b.raw, 10.0 - 50.0 - 10.0);
        assert_eq!(b.score, 0.0);
    }

    #[test]
    fn test_unknown_tier_uses_default_base() {
        assert_eq!(base_risk(EngagementTier::Unknown), 50.0);
        assert_eq!(RiskScorer::score(&features(0, Trend::Unknown), EngagementTier::Unknown), 50.0);
    }

    #[test]
    fn test_score_always_in_bounds() {
        let trends = [
            Trend::Increasing,
            Trend::Decreasing,
            Trend::Stable,
            Trend::Inactive,
            Trend::Unknown,
        ];
        let tiers = EngagementTier::ALL
            .into_iter()
            .chain(std::iter::once(EngagementTier::Unknown));

        for tier in tiers {
            for trend in trends {
                for recency in [i64::MIN / 4, -1_000, -1, 0, 1, 30, 999, i64::MAX / 4] {
                    let score = RiskScorer::score(&features(recency, trend), tier);
                    assert!((MIN_RISK..=MAX_RISK).contains(&score), "{tier} {trend} {recency}");
                }
            }
        }
    }

    #[test]
    fn test_score_all_pairs_rows() {
        let rows = vec![features(0, Trend::Stable), features(0, Trend::Stable)];
        let tiers = vec![EngagementTier::Casual, EngagementTier::Loyal];
        assert_eq!(RiskScorer::score_all(&rows, &tiers), vec![60.0, 20.0]);
    }
}
