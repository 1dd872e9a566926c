//! Recognition Classifier
//!
//! The single recognition rule shared by the single-turn test, the batch
//! evaluator, the dashboard aggregation and the data converter. Every call
//! site depends on this function so the rule cannot drift between them.

use crate::prediction::{ClassificationResult, Prediction};

/// Intent labels the NLU server emits for "did not understand".
pub const FALLBACK_LABELS: [&str; 2] = ["nlu_fallback", "out_of_scope"];

/// Decide whether a prediction counts as recognized at the given threshold.
///
/// Recognized means: a non-empty intent label that is not a fallback label,
/// with confidence at or above the threshold. Confidence exactly equal to the
/// threshold counts as recognized. There is no default threshold here; the
/// caller supplies one per invocation.
pub fn classify(prediction: &Prediction, threshold: f64) -> bool {
    let label = match &prediction.intent_label {
        Some(label) => label.trim(),
        None => return false,
    };

    if label.is_empty() {
        return false;
    }

    if FALLBACK_LABELS.contains(&label) {
        return false;
    }

    // NaN confidence (absent/undefined upstream) is treated as 0
    let confidence = if prediction.confidence.is_nan() {
        0.0
    } else {
        prediction.confidence
    };

    confidence >= threshold
}

/// Re-derive a result at a different threshold. The recognized flag is a
/// function of its inputs, never copied forward from the old result.
pub fn reclassify(result: &ClassificationResult, threshold: f64) -> ClassificationResult {
    ClassificationResult {
        recognized: result.error.is_none() && classify(&result.prediction, threshold),
        threshold,
        ..result.clone()
    }
}
