//! Report encoding
//!
//! Wraps an analysis table and its summary into a JSON report envelope
//! carrying producer metadata and the provenance of the run: who it was
//! for, which reference time and time column were used, and where the
//! pattern constants came from.

use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::patterns::{PatternSet, PatternSource, VerticalPatterns};
use crate::types::{AnalysisResult, Summary, TimeColumn};
use crate::{PRODUCER_NAME, VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Provenance of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportProvenance {
    pub company_name: String,
    pub industry: String,
    pub reference_time_utc: String,
    pub computed_at_utc: String,
    pub time_column: TimeColumn,
    pub pattern_source: PatternSource,
    pub total_customers_analyzed: u64,
    pub engagement_multiplier: f64,
    /// Reference figures for the configured industry, when the patterns know it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_benchmarks: Option<VerticalPatterns>,
}

/// Full report for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub report_id: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub results: Vec<AnalysisResult>,
    pub summary: Summary,
}

/// What an encoder needs to know about the run beyond its results
#[derive(Debug, Clone, Copy)]
pub struct RunInfo<'a> {
    pub config: &'a EngineConfig,
    pub patterns: &'a PatternSet,
    pub reference_time: DateTime<Utc>,
    pub time_column: TimeColumn,
}

/// Encoder for report envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the report envelope
    pub fn encode(
        &self,
        run: RunInfo<'_>,
        results: Vec<AnalysisResult>,
        summary: Summary,
    ) -> AnalysisReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            company_name: run.config.company_name.clone(),
            industry: run.config.industry.clone(),
            reference_time_utc: run.reference_time.to_rfc3339(),
            computed_at_utc: Utc::now().to_rfc3339(),
            time_column: run.time_column,
            pattern_source: run.patterns.source.clone(),
            total_customers_analyzed: run.patterns.universal.total_customers_analyzed,
            engagement_multiplier: run.patterns.universal.engagement_multiplier,
            industry_benchmarks: run.patterns.benchmarks(&run.config.industry).cloned(),
        };

        AnalysisReport {
            success: true,
            report_id: Uuid::new_v4().to_string(),
            producer,
            provenance,
            results,
            summary,
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json(
        &self,
        run: RunInfo<'_>,
        results: Vec<AnalysisResult>,
        summary: Summary,
    ) -> Result<String, AnalysisError> {
        let report = self.encode(run, results, summary);
        serde_json::to_string(&report).map_err(|e| AnalysisError::EncodingError(e.to_string()))
    }
}
