//! Engagement tier classification

use crate::types::{EngagementFeatures, EngagementTier};

/// Maps activity counts onto the universal engagement tiers
pub struct TierClassifier;

impl TierClassifier {
    /// Classify one feature record
    pub fn classify(features: &EngagementFeatures) -> EngagementTier {
        Self::classify_count(features.total_activities)
    }

    /// Classify a whole feature table, row for row
    pub fn classify_all(features: &[EngagementFeatures]) -> Vec<EngagementTier> {
        features.iter().map(Self::classify).collect()
    }

    /// Tier for a raw event count
    ///
    /// | count | tier           |
    /// |-------|----------------|
    /// | 0     | Never Active   |
    /// | 1     | Tried Once     |
    /// | 2     | Casual         |
    /// | 3-4   | Regular        |
    /// | 5-8   | Loyal          |
    /// | > 8   | Super Customer |
    pub fn classify_count(count: usize) -> EngagementTier {
        match count {
            0 => EngagementTier::NeverActive,
            1 => EngagementTier::TriedOnce,
            2 => EngagementTier::Casual,
            3..=4 => EngagementTier::Regular,
            5..=8 => EngagementTier::Loyal,
            _ => EngagementTier::SuperCustomer,
        }
    }
}
