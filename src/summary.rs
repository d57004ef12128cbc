//! Summary statistics over a finished analysis table

use crate::advisor::base_value;
use crate::types::{round2, AnalysisResult, EngagementTier, Summary, URGENT_RISK_THRESHOLD};
use std::collections::BTreeMap;

/// Share of a one-time customer's value assumed recoverable per at-risk customer
const RECOVERABLE_SHARE: f64 = 0.3;

/// Reduce a results table to business-level totals
pub fn summarize(results: &[AnalysisResult]) -> Summary {
    let total_customers = results.len();
    let at_risk_customers = results
        .iter()
        .filter(|r| r.churn_risk > URGENT_RISK_THRESHOLD)
        .count();
    let urgent_customers = results.iter().filter(|r| r.urgent).count();

    let avg_risk = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.churn_risk).sum::<f64>() / total_customers as f64
    };
    let total_predicted_value: f64 = results.iter().map(|r| r.predicted_ltv).sum();

    let mut engagement_breakdown: BTreeMap<EngagementTier, usize> = BTreeMap::new();
    for result in results {
        *engagement_breakdown.entry(result.engagement_level).or_insert(0) += 1;
    }

    let potential_savings = round2(
        at_risk_customers as f64 * base_value(EngagementTier::TriedOnce) * RECOVERABLE_SHARE,
    );

    Summary {
        total_customers,
        at_risk_customers,
        urgent_customers,
        avg_risk,
        total_predicted_value,
        engagement_breakdown,
        potential_savings,
    }
}
