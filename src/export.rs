//! CSV export
//!
//! Writes the analysis table as CSV, and builds the reduced CRM upload
//! format: one row per customer with a status, a follow-up date and the
//! campaign the recommended action belongs to.

use crate::error::AnalysisError;
use crate::types::{AnalysisResult, EngagementTier, RecommendedAction};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Default location of the CRM upload file
pub const DEFAULT_CRM_EXPORT_PATH: &str = "exports/crm_upload.csv";

/// Status written for urgent customers
const URGENT_STATUS: &str = "URGENT";

/// One row of the CRM upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmRecord {
    pub customer_id: String,
    pub engagement_level: EngagementTier,
    pub churn_risk: f64,
    pub recommended_action: RecommendedAction,
    pub urgent: bool,
    /// `URGENT` for urgent customers, otherwise the tier label
    pub status: String,
    pub next_action_date: NaiveDate,
    pub campaign: String,
}

impl CrmRecord {
    pub fn from_result(result: &AnalysisResult, next_action_date: NaiveDate) -> Self {
        let status = if result.urgent {
            URGENT_STATUS.to_string()
        } else {
            result.engagement_level.as_str().to_string()
        };

        Self {
            customer_id: result.customer_id.clone(),
            engagement_level: result.engagement_level,
            churn_risk: result.churn_risk,
            recommended_action: result.recommended_action,
            urgent: result.urgent,
            status,
            next_action_date,
            campaign: result.recommended_action.campaign().to_string(),
        }
    }
}

/// Exporter for CRM uploads and result tables
pub struct CrmExporter;

impl CrmExporter {
    /// Build CRM rows; follow-up is scheduled for the day after `now`
    pub fn records(results: &[AnalysisResult], now: DateTime<Utc>) -> Vec<CrmRecord> {
        let next_action_date = (now + Duration::days(1)).date_naive();
        results
            .iter()
            .map(|r| CrmRecord::from_result(r, next_action_date))
            .collect()
    }

    /// Write CRM rows as CSV
    pub fn write_csv<W: Write>(records: &[CrmRecord], writer: W) -> Result<(), AnalysisError> {
        write_rows(records, writer)
    }

    /// Write the CRM upload for `results` to `path`, creating parent directories
    pub fn export_to_path(
        results: &[AnalysisResult],
        now: DateTime<Utc>,
        path: &Path,
    ) -> Result<Vec<CrmRecord>, AnalysisError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let records = Self::records(results, now);
        let file = fs::File::create(path)?;
        Self::write_csv(&records, file)?;
        log::info!("export: wrote {} CRM rows to {}", records.len(), path.display());
        Ok(records)
    }

    /// Write the full analysis table as CSV
    pub fn write_results_csv<W: Write>(
        results: &[AnalysisResult],
        writer: W,
    ) -> Result<(), AnalysisError> {
        write_rows(results, writer)
    }
}

fn write_rows<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
