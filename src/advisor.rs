//! Retention action and lifetime value advice

use crate::types::{round2, EngagementTier, RecommendedAction};

/// Base lifetime value for an engagement tier, in currency units
pub fn base_value(tier: EngagementTier) -> f64 {
    match tier {
        EngagementTier::NeverActive => 0.0,
        EngagementTier::TriedOnce => 160.0,
        EngagementTier::Casual => 250.0,
        EngagementTier::Regular => 390.0,
        EngagementTier::Loyal => 510.0,
        EngagementTier::SuperCustomer => 630.0,
        EngagementTier::Unknown => 100.0,
    }
}

/// Maps (risk, tier) to an action and a predicted LTV
pub struct Advisor;

impl Advisor {
    /// Recommend an action; the first matching rung wins
    pub fn recommend(risk: f64, tier: EngagementTier) -> RecommendedAction {
        if risk > 85.0 {
            RecommendedAction::Urgent
        } else if risk > 70.0 {
            RecommendedAction::High
        } else if risk > 50.0 {
            RecommendedAction::Medium
        } else if risk > 30.0 {
            RecommendedAction::Low
        } else if tier == EngagementTier::SuperCustomer {
            RecommendedAction::Vip
        } else {
            RecommendedAction::OnTrack
        }
    }

    /// Predicted remaining lifetime value, rounded to cents
    ///
    /// `base_value(tier) * (100 - risk) / 100`
    pub fn predict_ltv(tier: EngagementTier, risk: f64) -> f64 {
        let risk_factor = (100.0 - risk) / 100.0;
        round2(base_value(tier) * risk_factor)
    }

    pub fn recommend_all(risks: &[f64], tiers: &[EngagementTier]) -> Vec<RecommendedAction> {
        risks
            .iter()
            .zip(tiers)
            .map(|(risk, tier)| Self::recommend(*risk, *tier))
            .collect()
    }

    pub fn predict_ltv_all(tiers: &[EngagementTier], risks: &[f64]) -> Vec<f64> {
        tiers
            .iter()
            .zip(risks)
            .map(|(tier, risk)| Self::predict_ltv(*tier, *risk))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_ladder() {
        let tier = EngagementTier::Regular;
        assert_eq!(Advisor::recommend(100.0, tier), RecommendedAction::Urgent);
        assert_eq!(Advisor::recommend(85.5, tier), RecommendedAction::Urgent);
        assert_eq!(Advisor::recommend(85.0, tier), RecommendedAction::High);
        assert_eq!(Advisor::recommend(70.0, tier), RecommendedAction::Medium);
        assert_eq!(Advisor::recommend(50.0, tier), RecommendedAction::Low);
        assert_eq!(Advisor::recommend(30.0, tier), RecommendedAction::OnTrack);
        assert_eq!(Advisor::recommend(0.0, tier), RecommendedAction::OnTrack);
    }

    #[test]
    fn test_vip_only_for_low_risk_super_customers() {
        let tier = EngagementTier::SuperCustomer;
        assert_eq!(Advisor::recommend(25.0, tier), RecommendedAction::Vip);
        assert_eq!(Advisor::recommend(30.0, tier), RecommendedAction::Vip);
        assert_eq!(Advisor::recommend(30.5, tier), RecommendedAction::Low);
        assert_eq!(Advisor::recommend(90.0, tier), RecommendedAction::Urgent);
    }

    #[test]
    fn test_predict_ltv() {
        assert_eq!(Advisor::predict_ltv(EngagementTier::SuperCustomer, 25.0), 472.5);
        assert_eq!(Advisor::predict_ltv(EngagementTier::NeverActive, 0.0), 0.0);
        assert_eq!(Advisor::predict_ltv(EngagementTier::Unknown, 50.0), 50.0);
        assert_eq!(Advisor::predict_ltv(EngagementTier::TriedOnce, 100.0), 0.0);
        assert_eq!(Advisor::predict_ltv(EngagementTier::Casual, 33.333), 166.67);
    }

    #[test]
    fn test_ltv_non_increasing_in_risk() {
        for tier in EngagementTier::ALL {
            let values: Vec<f64> = (0..=1000)
                .map(|r| Advisor::predict_ltv(tier, r as f64 / 10.0))
                .collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]), "{tier}");
            assert!(values.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_batch_helpers_pair_rows() {
        let tiers = vec![EngagementTier::Loyal, EngagementTier::SuperCustomer];
        let risks = vec![20.0, 10.0];
        assert_eq!(
            Advisor::recommend_all(&risks, &tiers),
            vec![RecommendedAction::OnTrack, RecommendedAction::Vip]
        );
        assert_eq!(Advisor::predict_ltv_all(&tiers, &risks), vec![408.0, 567.0]);
    }
}
