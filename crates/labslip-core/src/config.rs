//! Runtime configuration.
//!
//! Everything the system stamps onto slips and documents beyond the
//! submitted procedure data is injected here; there are no hidden
//! practice or lab constants in the library.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Practice sender block printed on every rendered slip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeInfo {
    /// Practice name
    pub name: String,
    /// Street address
    pub address: String,
    /// City, state and postal code on one line
    pub city_state_zip: String,
    /// Phone number
    pub phone: String,
}

impl Default for PracticeInfo {
    fn default() -> Self {
        Self {
            name: "Example Dental Practice".into(),
            address: "123 Main Street".into(),
            city_state_zip: "Anytown, CA 00000".into(),
            phone: "(555) 555-0100".into(),
        }
    }
}

/// Top-level configuration for managers and renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabSlipConfig {
    /// Lab assigned to new slips when the submission names none
    pub default_lab_id: Option<String>,
    /// Practice sender info for rendered documents
    pub practice: PracticeInfo,
    /// Base URL generated documents are published under
    pub artifact_base_url: String,
}

impl Default for LabSlipConfig {
    fn default() -> Self {
        Self {
            default_lab_id: None,
            practice: PracticeInfo::default(),
            artifact_base_url: "https://storage.example.com/lab-slips".into(),
        }
    }
}

impl LabSlipConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults, so partial files work.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
