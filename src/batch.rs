//! Batch Evaluator
//!
//! Orchestrates one evaluation run: parse the uploaded dataset, call the
//! predictor once per utterance, classify each prediction, aggregate, and
//! hand the completed record to the store as a single unit.

use crate::aggregator;
use crate::classifier;
use crate::config::EvalConfig;
use crate::error::{ConsoleError, Result};
use crate::format::DataFormat;
use crate::prediction::{BatchRecord, ClassificationResult, Prediction};
use crate::predictor::Predictor;
use crate::store::BatchStore;
use crate::upload;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Lifecycle of one batch run. A run moves forward only; any non-terminal
/// state can fall to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Uploading,
    Parsed,
    Evaluating,
    Completed,
    Failed,
}

/// Result of a completed run. The record is always returned, even when
/// persistence failed, so the computed summary stays viewable.
#[derive(Debug)]
pub struct BatchOutcome {
    pub record: BatchRecord,
    /// Set when the store rejected the record; the run itself still completed.
    pub persist_error: Option<ConsoleError>,
}

/// One evaluator instance drives exactly one batch run. A second trigger on
/// the same instance is rejected, never queued, so a double click cannot
/// persist the same dataset twice.
pub struct BatchEvaluator {
    config: EvalConfig,
    state: Mutex<BatchState>,
    cancelled: AtomicBool,
}

impl BatchEvaluator {
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(BatchState::Idle),
            cancelled: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Request cancellation. The in-flight predictor call completes but its
    /// result is discarded and nothing is persisted.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn set_state(&self, next: BatchState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Claim the run slot; only the Idle -> Uploading transition may succeed.
    fn begin(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != BatchState::Idle {
            return Err(ConsoleError::Validation(format!(
                "batch run already triggered (state: {:?})",
                *state
            )));
        }
        *state = BatchState::Uploading;
        Ok(())
    }

    /// Evaluate one utterance: one predictor call, wall-clock latency, the
    /// shared classification rule. A predictor failure becomes an
    /// unrecognized result carrying the error instead of aborting anything.
    pub async fn evaluate_item(
        &self,
        predictor: &dyn Predictor,
        text: &str,
    ) -> ClassificationResult {
        let threshold = self.config.confidence_threshold;
        let started = Instant::now();
        match predictor.predict(text).await {
            Ok(prediction) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let recognized = classifier::classify(&prediction, threshold);
                ClassificationResult {
                    text: text.to_string(),
                    prediction,
                    threshold,
                    recognized,
                    response_time_ms: Some(elapsed_ms),
                    error: None,
                }
            }
            Err(e) => {
                warn!(utterance = %text, error = %e, "predictor call failed; recording as unrecognized");
                ClassificationResult {
                    text: text.to_string(),
                    prediction: Prediction::empty(),
                    threshold,
                    recognized: false,
                    response_time_ms: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Single-turn test: same call, same rule, but a transport failure is
    /// surfaced directly since there is no batch to protect.
    pub async fn evaluate_single(
        &self,
        predictor: &dyn Predictor,
        text: &str,
    ) -> Result<ClassificationResult> {
        if text.trim().is_empty() {
            return Err(ConsoleError::Validation(
                "utterance must not be empty".to_string(),
            ));
        }
        let result = self.evaluate_item(predictor, text).await;
        match result.error {
            Some(message) => Err(ConsoleError::Predictor(message)),
            None => Ok(result),
        }
    }

    /// Run the full batch over an uploaded blob.
    ///
    /// Items keep input order. Calls are sequential, so at most one request
    /// is in flight against the NLU server at a time.
    pub async fn run(
        &self,
        predictor: &dyn Predictor,
        store: &dyn BatchStore,
        test_name: &str,
        file_name: &str,
        blob: &str,
        declared_format: Option<DataFormat>,
    ) -> Result<BatchOutcome> {
        self.begin()?;

        let utterances = match upload::extract_utterances(file_name, blob, declared_format) {
            Ok(utterances) => utterances,
            Err(e) => {
                self.set_state(BatchState::Failed);
                return Err(e);
            }
        };
        self.set_state(BatchState::Parsed);

        info!(
            test_name,
            count = utterances.len(),
            threshold = self.config.confidence_threshold,
            "starting batch evaluation"
        );
        self.set_state(BatchState::Evaluating);

        let mut items: Vec<ClassificationResult> = Vec::with_capacity(utterances.len());
        for text in &utterances {
            if self.cancelled.load(Ordering::SeqCst) {
                info!(test_name, "batch cancelled; discarding partial results");
                self.set_state(BatchState::Failed);
                return Err(ConsoleError::Cancelled);
            }
            items.push(self.evaluate_item(predictor, text).await);
        }

        let summary = aggregator::summarize(&items, self.config.confidence_threshold);
        let record = BatchRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            test_name: test_name.to_string(),
            threshold_used: self.config.confidence_threshold,
            summary,
            items,
        };
        self.set_state(BatchState::Completed);
        info!(
            test_name,
            recognized = record.summary.recognized_count,
            total = record.summary.total_count,
            "batch evaluation completed"
        );

        let persist_error = match store.persist_batch(&record) {
            Ok(_) => None,
            Err(e) => {
                error!(test_name, error = %e, "failed to persist batch record");
                Some(e)
            }
        };

        Ok(BatchOutcome {
            record,
            persist_error,
        })
    }
}
