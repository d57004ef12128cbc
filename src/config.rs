//! Engine configuration

use crate::patterns::DEFAULT_PATTERNS_PATH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings an engine is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Company the analysis is run for (provenance only)
    pub company_name: String,
    /// Business vertical, used to pick reference benchmarks
    pub industry: String,
    /// Location of the external pattern document
    pub patterns_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            industry: "unknown".to_string(),
            patterns_path: PathBuf::from(DEFAULT_PATTERNS_PATH),
        }
    }
}

impl EngineConfig {
    pub fn new(company_name: impl Into<String>, industry: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            industry: industry.into(),
            ..Self::default()
        }
    }

    pub fn with_patterns_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.patterns_path = path.into();
        self
    }
}
