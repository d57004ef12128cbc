//! Universal pattern store
//!
//! Holds the reference constants discovered across verticals: per-tier
//! retention and spend figures, the universal engagement multiplier, and
//! the number of customers the figures were derived from. The set is read
//! once when an engine is built and is immutable afterwards.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Well-known location of the external pattern document
pub const DEFAULT_PATTERNS_PATH: &str = "models/universal_patterns.json";

/// Reference figures for one tier within a vertical
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBenchmark {
    /// Share of customers still active after 7 days (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_7day: Option<f64>,
    /// Average spend in currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_spend: Option<f64>,
}

impl TierBenchmark {
    fn retention(value: f64) -> Self {
        Self {
            retention_7day: Some(value),
            avg_spend: None,
        }
    }

    fn spend(value: f64) -> Self {
        Self {
            retention_7day: None,
            avg_spend: Some(value),
        }
    }
}

/// Tier label -> benchmark, for one vertical
pub type VerticalPatterns = BTreeMap<String, TierBenchmark>;

/// Cross-vertical figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalPatterns {
    pub engagement_multiplier: f64,
    pub total_customers_analyzed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries_covered: Option<serde_json::Value>,
}

/// Where a pattern set came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum PatternSource {
    #[default]
    BuiltIn,
    File(PathBuf),
}

/// The reference constants consulted by an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub universal: UniversalPatterns,
    #[serde(flatten)]
    pub verticals: BTreeMap<String, VerticalPatterns>,
    #[serde(skip)]
    pub source: PatternSource,
}

#[derive(Debug, Deserialize)]
struct PatternsFile {
    discovered_patterns: PatternSet,
}

#[derive(Serialize)]
struct PatternsFileRef<'a> {
    discovered_patterns: &'a PatternSet,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::built_in()
    }
}

impl PatternSet {
    /// The embedded fallback set
    pub fn built_in() -> Self {
        let gaming: VerticalPatterns = [
            ("Tried Once", 0.02),
            ("Casual", 0.18),
            ("Regular", 0.47),
            ("Hardcore", 0.70),
            ("Obsessed", 0.84),
        ]
        .into_iter()
        .map(|(tier, retention)| (tier.to_string(), TierBenchmark::retention(retention)))
        .collect();

        let ecommerce: VerticalPatterns = [
            ("Tried Once", 160.99),
            ("Casual", 245.67),
            ("Regular", 389.45),
            ("Loyal", 512.33),
            ("Super Customer", 629.78),
        ]
        .into_iter()
        .map(|(tier, spend)| (tier.to_string(), TierBenchmark::spend(spend)))
        .collect();

        let mut verticals = BTreeMap::new();
        verticals.insert("gaming".to_string(), gaming);
        verticals.insert("ecommerce".to_string(), ecommerce);

        Self {
            universal: UniversalPatterns {
                engagement_multiplier: 3.9,
                total_customers_analyzed: 189_630,
                industries_covered: None,
            },
            verticals,
            source: PatternSource::BuiltIn,
        }
    }

    /// Parse a pattern document (`{"discovered_patterns": {...}}`)
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let file: PatternsFile = serde_json::from_str(json)?;
        Ok(file.discovered_patterns)
    }

    /// Serialize back into the document shape accepted by [`PatternSet::from_json`]
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(&PatternsFileRef {
            discovered_patterns: self,
        })?)
    }

    /// Read a pattern document from disk, surfacing any failure
    pub fn try_load(path: &Path) -> Result<Self, AnalysisError> {
        let content = fs::read_to_string(path)?;
        let mut patterns = Self::from_json(&content)?;
        patterns.source = PatternSource::File(path.to_path_buf());
        Ok(patterns)
    }

    /// Read a pattern document, falling back to the built-in set on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(patterns) => {
                log::info!(
                    "patterns: loaded {} verticals from {}",
                    patterns.verticals.len(),
                    path.display()
                );
                patterns
            }
            Err(e) => {
                log::warn!(
                    "patterns: {} unavailable ({e}), using built-in defaults",
                    path.display()
                );
                Self::built_in()
            }
        }
    }

    /// Per-tier benchmarks for one vertical, if known
    pub fn benchmarks(&self, vertical: &str) -> Option<&VerticalPatterns> {
        self.verticals.get(&vertical.to_lowercase())
    }

    pub fn is_built_in(&self) -> bool {
        self.source == PatternSource::BuiltIn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("churn-flux-{}-{name}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_built_in_constants() {
        let patterns = PatternSet::built_in();
        assert_eq!(patterns.universal.total_customers_analyzed, 189_630);
        assert!((patterns.universal.engagement_multiplier - 3.9).abs() < 1e-9);

        let ecommerce = patterns.benchmarks("ecommerce").unwrap();
        assert_eq!(ecommerce["Super Customer"].avg_spend, Some(629.78));
        let gaming = patterns.benchmarks("Gaming").unwrap();
        assert_eq!(gaming["Obsessed"].retention_7day, Some(0.84));
        assert!(patterns.benchmarks("subscription").is_none());
    }

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "discovered_patterns": {
                "subscription": {
                    "Regular": { "retention_7day": 0.55 },
                    "Loyal": { "avg_spend": 300.0 }
                },
                "universal": {
                    "engagement_multiplier": 4.2,
                    "total_customers_analyzed": 1000,
                    "industries_covered": 3
                }
            }
        }"#;

        let patterns = PatternSet::from_json(json).unwrap();
        assert_eq!(patterns.verticals.len(), 1);
        assert_eq!(patterns.universal.total_customers_analyzed, 1000);
        assert_eq!(
            patterns.benchmarks("subscription").unwrap()["Regular"],
            TierBenchmark::retention(0.55)
        );
    }

    #[test]
    fn test_document_round_trip_keeps_shape() {
        let patterns = PatternSet::built_in();
        let json = patterns.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["discovered_patterns"]["universal"].is_object());
        assert!(value["discovered_patterns"]["gaming"].is_object());

        let parsed = PatternSet::from_json(&json).unwrap();
        assert_eq!(parsed, patterns);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let patterns = PatternSet::load(&temp_path("missing.json"));
        assert!(patterns.is_built_in());
        assert_eq!(patterns, PatternSet::built_in());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let path = temp_path("malformed.json");
        fs::write(&path, "{ not json").unwrap();

        let patterns = PatternSet::load(&path);
        assert!(patterns.is_built_in());
        assert!(PatternSet::try_load(&path).is_err());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_source_recorded() {
        let path = temp_path("patterns.json");
        fs::write(&path, PatternSet::built_in().to_json().unwrap()).unwrap();

        let patterns = PatternSet::load(&path);
        assert_eq!(patterns.source, PatternSource::File(path.clone()));
        assert!(!patterns.is_built_in());

        fs::remove_file(&path).ok();
    }
}
