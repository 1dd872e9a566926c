//! Evaluation configuration.
//!
//! Passed explicitly into the evaluator rather than read from ambient state,
//! so two concurrent batch runs can carry different settings.

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.80;
pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Minimum confidence for an intent to count as recognized.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Threshold below which the NLU server itself falls back; recorded with
    /// the batch for reporting, not consulted by the classifier.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,
    /// Base URL of the NLU server, e.g. "http://localhost:5005".
    #[serde(default)]
    pub server_url: Option<String>,
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_fallback_threshold() -> f64 {
    DEFAULT_FALLBACK_THRESHOLD
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            server_url: None,
        }
    }
}

impl EvalConfig {
    /// Reject thresholds outside [0, 1] before any evaluation starts.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("fallback_threshold", self.fallback_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConsoleError::Validation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}
