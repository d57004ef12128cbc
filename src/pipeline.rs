//! Pipeline orchestration
//!
//! This module provides the public API for churn-flux. It runs the stages in
//! order over whole tables:
//!
//! 1. EngagementExtractor - customer + activity tables to feature records
//! 2. TierClassifier - feature records to engagement tiers
//! 3. RiskScorer - tier, recency and trend to churn risk
//! 4. Advisor - risk and tier to action and predicted LTV
//! 5. summarize / ReportEncoder - totals and the report envelope

use crate::advisor::Advisor;
use crate::config::EngineConfig;
use crate::encoder::{AnalysisReport, ReportEncoder, RunInfo};
use crate::error::AnalysisError;
use crate::features::EngagementExtractor;
use crate::patterns::PatternSet;
use crate::risk::RiskScorer;
use crate::schema::{RawTable, TableAdapter};
use crate::summary::summarize;
use crate::tier::TierClassifier;
use crate::types::{
    ActivityTable, AnalysisResult, CustomerTable, Summary, URGENT_RISK_THRESHOLD,
};
use chrono::{DateTime, Utc};

/// Analyze a JSON request body and return the report JSON (stateless, one-shot).
///
/// The body has the shape `{"customers": [...], "activities": [...]}`;
/// patterns are read from the default location.
///
/// # Example
/// ```ignore
/// let report_json = analyze_request(body, Utc::now())?;
/// ```
pub fn analyze_request(request_json: &str, now: DateTime<Utc>) -> Result<String, AnalysisError> {
    ChurnEngine::new(EngineConfig::default()).analyze_request_at(request_json, now)
}

/// Customer analysis engine.
///
/// Holds the configuration and the pattern set loaded at construction. Both
/// are read-only, so one engine can serve any number of independent runs.
#[derive(Debug, Clone)]
pub struct ChurnEngine {
    config: EngineConfig,
    patterns: PatternSet,
}

impl Default for ChurnEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ChurnEngine {
    /// Create an engine, loading patterns from `config.patterns_path`
    pub fn new(config: EngineConfig) -> Self {
        let patterns = PatternSet::load(&config.patterns_path);
        Self::with_patterns(config, patterns)
    }

    /// Create an engine with an explicit pattern set
    pub fn with_patterns(config: EngineConfig, patterns: PatternSet) -> Self {
        log::info!(
            "engine: initialized for '{}' ({}), knowledge from {} customers",
            config.company_name,
            config.industry,
            patterns.universal.total_customers_analyzed
        );
        Self { config, patterns }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Analyze typed tables against the current wall-clock time
    ///
    /// The clock is read once, so every customer in the run shares one "now".
    pub fn analyze(
        &self,
        customers: &CustomerTable,
        activities: &ActivityTable,
    ) -> Vec<AnalysisResult> {
        self.analyze_at(customers, activities, Utc::now())
    }

    /// Analyze typed tables against a fixed reference time
    pub fn analyze_at(
        &self,
        customers: &CustomerTable,
        activities: &ActivityTable,
        now: DateTime<Utc>,
    ) -> Vec<AnalysisResult> {
        // Stage 1: Extract engagement features
        let features = EngagementExtractor::extract(customers, activities, now);
        log::debug!(
            "pipeline: extracted features for {} customers from {} events ({} time)",
            features.len(),
            activities.len(),
            activities.time_column.as_str()
        );

        // Stage 2: Assign tiers
        let tiers = TierClassifier::classify_all(&features);

        // Stage 3: Score churn risk
        let risks = RiskScorer::score_all(&features, &tiers);

        // Stage 4: Recommend actions and predict value
        let actions = Advisor::recommend_all(&risks, &tiers);
        let ltvs = Advisor::predict_ltv_all(&tiers, &risks);

        let results: Vec<AnalysisResult> = features
            .into_iter()
            .zip(tiers)
            .zip(risks)
            .zip(actions)
            .zip(ltvs)
            .map(|((((f, tier), risk), action), ltv)| AnalysisResult {
                customer_id: f.customer_id,
                engagement_level: tier,
                churn_risk: risk,
                recommended_action: action,
                predicted_ltv: ltv,
                urgent: risk > URGENT_RISK_THRESHOLD,
                total_activities: f.total_activities,
                active_days: f.active_days,
                recency_days: f.recency_days,
                frequency_trend: f.frequency_trend,
                avg_duration: f.avg_duration,
                total_value: f.total_value,
            })
            .collect();

        log::info!("pipeline: analysis complete for {} customers", results.len());
        results
    }

    /// Validate raw tables, then analyze them
    pub fn analyze_tables(
        &self,
        customers: &RawTable,
        activities: &RawTable,
        now: DateTime<Utc>,
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        let customers = TableAdapter::customers(customers)?;
        let activities = TableAdapter::activities(activities)?;
        Ok(self.analyze_at(&customers, &activities, now))
    }

    /// Summary statistics for a results table
    pub fn summarize(&self, results: &[AnalysisResult]) -> Summary {
        summarize(results)
    }

    /// Analyze and wrap the results in a report envelope
    pub fn report_at(
        &self,
        customers: &CustomerTable,
        activities: &ActivityTable,
        now: DateTime<Utc>,
    ) -> AnalysisReport {
        let results = self.analyze_at(customers, activities, now);
        let summary = summarize(&results);
        ReportEncoder::new().encode(self.run_info(activities, now), results, summary)
    }

    /// Analyze a JSON request body and return the report JSON
    pub fn analyze_request_at(
        &self,
        request_json: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AnalysisError> {
        let (customers, activities) = TableAdapter::parse_request(request_json)?;
        let results = self.analyze_at(&customers, &activities, now);
        let summary = summarize(&results);
        ReportEncoder::new().encode_to_json(self.run_info(&activities, now), results, summary)
    }

    fn run_info<'a>(&'a self, activities: &ActivityTable, now: DateTime<Utc>) -> RunInfo<'a> {
        RunInfo {
            config: &self.config,
            patterns: &self.patterns,
            reference_time: now,
            time_column: activities.time_column,
        }
    }
}
