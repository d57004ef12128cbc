//! churn-flux - Universal customer engagement and churn-risk engine
//!
//! churn-flux turns raw customer activity logs into engagement tiers, churn
//! risk, retention actions and predicted lifetime value through a
//! deterministic pipeline: table adaptation → feature extraction → tier
//! classification → risk scoring → action/value advice → summary.
//!
//! The same logic applies to any vertical (e-commerce, gaming,
//! subscription, ...) because activity is normalized into six universal
//! engagement tiers.

pub mod advisor;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod features;
pub mod patterns;
pub mod pipeline;
pub mod risk;
pub mod schema;
pub mod summary;
pub mod tier;
pub mod types;

pub use config::EngineConfig;
pub use error::AnalysisError;
pub use patterns::PatternSet;
pub use pipeline::{analyze_request, ChurnEngine};
pub use summary::summarize;
pub use types::{
    ActivityEvent, ActivityTable, AnalysisResult, Customer, CustomerTable, EngagementFeatures,
    EngagementTier, RecommendedAction, Summary, Trend,
};

/// Crate version embedded in report envelopes
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report envelopes
pub const PRODUCER_NAME: &str = "churn-flux";
