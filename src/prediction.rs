use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entity span extracted by the NLU server.
///
/// Matches arrive in insertion order, NOT sorted by offset; renderers that
/// build non-overlapping highlighted spans must call [`Prediction::sorted_entities`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMatch {
    #[serde(rename = "entity")]
    pub entity_type: String,
    pub value: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub confidence: f64,
}

/// A single model prediction for one utterance. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub intent_label: Option<String>,
    pub confidence: f64,
    pub entities: Vec<EntityMatch>,
    /// Untouched server response, kept for export and debugging.
    #[serde(default)]
    pub raw_payload: serde_json::Value,
}

impl Prediction {
    /// A prediction carrying no intent at all, used when the predictor call
    /// itself failed. Never classifies as recognized.
    pub fn empty() -> Self {
        Self {
            intent_label: None,
            confidence: 0.0,
            entities: Vec::new(),
            raw_payload: serde_json::Value::Null,
        }
    }

    /// Entities ordered by start offset, for span rendering.
    pub fn sorted_entities(&self) -> Vec<EntityMatch> {
        let mut sorted = self.entities.clone();
        sorted.sort_by_key(|e| (e.start_offset, e.end_offset));
        sorted
    }
}

/// Outcome of classifying one utterance against a threshold.
///
/// `recognized` is derived from (label, confidence, threshold) and nothing
/// else; reclassifying with a different threshold must recompute it rather
/// than reuse a stale flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub text: String,
    pub prediction: Prediction,
    pub threshold: f64,
    pub recognized: bool,
    pub response_time_ms: Option<u64>,
    /// Predictor failure message for this item, if the call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate statistics over one batch of classification results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_count: usize,
    pub recognized_count: usize,
    /// 100 * recognized / total, unrounded. 0 for an empty batch.
    pub recognition_rate_pct: f64,
    pub threshold: f64,
    pub average_response_time_ms: Option<f64>,
}

/// One persisted batch run: summary plus per-item results, stored as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub test_name: String,
    pub threshold_used: f64,
    pub summary: BatchSummary,
    pub items: Vec<ClassificationResult>,
}
