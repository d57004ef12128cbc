//! Core types for the churn-flux pipeline
//!
//! This module defines the tables that flow through each stage of the
//! pipeline: the caller's customer and activity tables, the per-customer
//! engagement features, and the finished analysis rows and summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Recency reported for customers with no recorded activity
pub const NEVER_SEEN_RECENCY_DAYS: i64 = 999;

/// Churn risk above which a customer is flagged urgent
pub const URGENT_RISK_THRESHOLD: f64 = 70.0;

/// A single customer identity row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
}

impl Customer {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
        }
    }
}

/// Customer identity table supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerTable {
    pub customers: Vec<Customer>,
}

impl CustomerTable {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self { customers }
    }

    /// Build a table from bare identifiers
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            customers: ids.into_iter().map(Customer::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

/// Which input column event times were read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeColumn {
    Timestamp,
    Date,
    /// Neither column was present; every event is stamped with the run's "now"
    Synthetic,
}

impl TimeColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeColumn::Timestamp => "timestamp",
            TimeColumn::Date => "date",
            TimeColumn::Synthetic => "synthetic",
        }
    }
}

/// One observed customer action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Owning customer; events without one never match a customer
    pub customer_id: Option<String>,
    /// Event time; `None` resolves to the run's reference time
    pub occurred_at: Option<DateTime<Utc>>,
    /// Session length or similar duration measure
    pub duration: Option<f64>,
    /// Monetary or point value attached to the event
    pub value: Option<f64>,
}

impl ActivityEvent {
    pub fn new(customer_id: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            occurred_at: Some(occurred_at),
            duration: None,
            value: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// Activity event table supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTable {
    pub time_column: TimeColumn,
    pub events: Vec<ActivityEvent>,
}

impl Default for ActivityTable {
    fn default() -> Self {
        Self {
            time_column: TimeColumn::Synthetic,
            events: Vec::new(),
        }
    }
}

impl ActivityTable {
    /// Build a table whose events carry explicit timestamps
    pub fn new(events: Vec<ActivityEvent>) -> Self {
        Self {
            time_column: TimeColumn::Timestamp,
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Direction of a customer's recent activity density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    /// Customer exists but has no events in a non-empty activity table
    Inactive,
    /// No activity table was available at all
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::Inactive => "inactive",
            Trend::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Universal engagement tier, ordered from least to most engaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EngagementTier {
    #[serde(rename = "Never Active")]
    NeverActive,
    #[serde(rename = "Tried Once")]
    TriedOnce,
    Casual,
    Regular,
    Loyal,
    #[serde(rename = "Super Customer")]
    SuperCustomer,
    Unknown,
}

impl EngagementTier {
    /// The six tiers the classifier can assign
    pub const ALL: [EngagementTier; 6] = [
        EngagementTier::NeverActive,
        EngagementTier::TriedOnce,
        EngagementTier::Casual,
        EngagementTier::Regular,
        EngagementTier::Loyal,
        EngagementTier::SuperCustomer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementTier::NeverActive => "Never Active",
            EngagementTier::TriedOnce => "Tried Once",
            EngagementTier::Casual => "Casual",
            EngagementTier::Regular => "Regular",
            EngagementTier::Loyal => "Loyal",
            EngagementTier::SuperCustomer => "Super Customer",
            EngagementTier::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EngagementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed engagement features derived for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementFeatures {
    pub customer_id: String,
    pub total_activities: usize,
    pub active_days: usize,
    /// Whole days since the latest event; negative for future-dated events
    pub recency_days: i64,
    pub frequency_trend: Trend,
    /// Absent when the run had no activity table at all
    pub avg_duration: Option<f64>,
    /// Absent when the run had no activity table at all
    pub total_value: Option<f64>,
}

impl EngagementFeatures {
    /// Features for a customer when the run has no activity data
    pub fn without_activity_data(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            total_activities: 0,
            active_days: 0,
            recency_days: NEVER_SEEN_RECENCY_DAYS,
            frequency_trend: Trend::Unknown,
            avg_duration: None,
            total_value: None,
        }
    }

    /// Features for a customer with no matching events in a non-empty table
    pub fn inactive(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            total_activities: 0,
            active_days: 0,
            recency_days: NEVER_SEEN_RECENCY_DAYS,
            frequency_trend: Trend::Inactive,
            avg_duration: Some(0.0),
            total_value: Some(0.0),
        }
    }
}

/// Retention action recommended for a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendedAction {
    #[serde(rename = "URGENT: personal call + 30% discount")]
    Urgent,
    #[serde(rename = "HIGH: personal email from leadership + 20% off")]
    High,
    #[serde(rename = "MEDIUM: re-engagement campaign")]
    Medium,
    #[serde(rename = "LOW: newsletter + recommendations")]
    Low,
    #[serde(rename = "VIP: referral ask + early access")]
    Vip,
    #[serde(rename = "ON TRACK: continue regular engagement")]
    OnTrack,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Urgent => "URGENT: personal call + 30% discount",
            RecommendedAction::High => "HIGH: personal email from leadership + 20% off",
            RecommendedAction::Medium => "MEDIUM: re-engagement campaign",
            RecommendedAction::Low => "LOW: newsletter + recommendations",
            RecommendedAction::Vip => "VIP: referral ask + early access",
            RecommendedAction::OnTrack => "ON TRACK: continue regular engagement",
        }
    }

    /// Campaign label: the action text before its first ':'
    pub fn campaign(&self) -> &'static str {
        let text = self.as_str();
        match text.split_once(':') {
            Some((prefix, _)) => prefix,
            None => "General",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished row of the analysis table
///
/// Fields are kept flat so the row serializes to CSV as well as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub customer_id: String,
    pub engagement_level: EngagementTier,
    pub churn_risk: f64,
    pub recommended_action: RecommendedAction,
    pub predicted_ltv: f64,
    pub urgent: bool,
    pub total_activities: usize,
    pub active_days: usize,
    pub recency_days: i64,
    pub frequency_trend: Trend,
    pub avg_duration: Option<f64>,
    pub total_value: Option<f64>,
}

/// Business-level totals over one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_customers: usize,
    pub at_risk_customers: usize,
    pub urgent_customers: usize,
    pub avg_risk: f64,
    pub total_predicted_value: f64,
    pub engagement_breakdown: BTreeMap<EngagementTier, usize>,
    pub potential_savings: f64,
}

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
