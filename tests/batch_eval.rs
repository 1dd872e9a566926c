use async_trait::async_trait;
use intent_console::batch::{BatchEvaluator, BatchState};
use intent_console::config::EvalConfig;
use intent_console::error::{ConsoleError, Result};
use intent_console::export;
use intent_console::prediction::Prediction;
use intent_console::predictor::Predictor;
use intent_console::store::{dashboard_totals, BatchStore, MemoryBatchStore};

/// Predictor that answers from a fixed script, in input-independent order.
/// Utterances without a script entry fail like a transport error would.
struct FakeNluServer {
    script: Vec<(&'static str, Option<&'static str>, f64)>,
}

#[async_trait]
impl Predictor for FakeNluServer {
    async fn predict(&self, text: &str) -> Result<Prediction> {
        for (utterance, label, confidence) in &self.script {
            if *utterance == text {
                return Ok(Prediction {
                    intent_label: label.map(|l| l.to_string()),
                    confidence: *confidence,
                    entities: Vec::new(),
                    raw_payload: serde_json::json!({"text": text}),
                });
            }
        }
        Err(ConsoleError::Predictor(format!(
            "connection refused while parsing '{}'",
            text
        )))
    }
}

fn evaluator(threshold: f64) -> BatchEvaluator {
    BatchEvaluator::new(EvalConfig::default().with_threshold(threshold)).unwrap()
}

#[tokio::test]
async fn end_to_end_batch_against_csv_upload() {
    let server = FakeNluServer {
        script: vec![
            ("book me a flight to Oslo", Some("book_flight"), 0.92),
            ("blorp", Some("nlu_fallback"), 0.40),
            ("good morning", Some("greet"), 0.79),
        ],
    };
    let store = MemoryBatchStore::new();
    let evaluator = evaluator(0.80);

    let blob = "id,text\n1,book me a flight to Oslo\n2,blorp\n3,good morning\n";
    let outcome = evaluator
        .run(&server, &store, "regression", "dataset.csv", blob, None)
        .await
        .expect("batch should complete");

    let flags: Vec<bool> = outcome.record.items.iter().map(|i| i.recognized).collect();
    assert_eq!(flags, vec![true, false, false]);
    assert_eq!(outcome.record.summary.recognized_count, 1);
    assert_eq!(outcome.record.summary.total_count, 3);
    assert!((outcome.record.summary.recognition_rate_pct - 33.333333333333336).abs() < 1e-6);
    assert_eq!(evaluator.state(), BatchState::Completed);

    // The record went to the store as one unit and can be read back
    let fetched = store.fetch_batch(outcome.record.id).unwrap();
    assert_eq!(fetched.items.len(), 3);
    assert_eq!(fetched.threshold_used, 0.80);
}

#[tokio::test]
async fn predictor_failure_for_one_item_keeps_the_rest() {
    let server = FakeNluServer {
        script: vec![
            ("alpha", Some("greet"), 0.95),
            // "beta" missing from the script: its call fails
            ("gamma", Some("greet"), 0.90),
        ],
    };
    let store = MemoryBatchStore::new();
    let evaluator = evaluator(0.80);

    let outcome = evaluator
        .run(
            &server,
            &store,
            "partial",
            "utterances.txt",
            "alpha\nbeta\ngamma\n",
            None,
        )
        .await
        .expect("partial predictor failure must not fail the batch");

    assert_eq!(outcome.record.items.len(), 3);
    assert_eq!(outcome.record.items[1].text, "beta");
    assert!(!outcome.record.items[1].recognized);
    let message = outcome.record.items[1].error.as_deref().unwrap();
    assert!(message.contains("connection refused"));
    assert_eq!(evaluator.state(), BatchState::Completed);
    assert_eq!(outcome.record.summary.recognized_count, 2);
}

#[tokio::test]
async fn stored_batches_feed_the_dashboard() {
    let server = FakeNluServer {
        script: vec![
            ("hello", Some("greet"), 0.95),
            ("bye", Some("goodbye"), 0.60),
        ],
    };
    let store = MemoryBatchStore::new();

    for name in ["run-a", "run-b"] {
        let evaluator = evaluator(0.80);
        evaluator
            .run(&server, &store, name, "data.txt", "hello\nbye\n", None)
            .await
            .unwrap();
    }

    let rows = store.list_batches(0, 10).unwrap();
    assert_eq!(rows.len(), 2);
    let totals = dashboard_totals(&rows);
    assert_eq!(totals.total_items, 4);
    assert_eq!(totals.total_recognized, 2);
    assert!((totals.overall_recognition_rate_pct - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn exported_results_line_up_with_the_batch() {
    let server = FakeNluServer {
        script: vec![("hello, world", Some("greet"), 0.91)],
    };
    let store = MemoryBatchStore::new();
    let evaluator = evaluator(0.80);

    let outcome = evaluator
        .run(
            &server,
            &store,
            "export",
            "data.json",
            r#"[{"text": "hello, world"}]"#,
            None,
        )
        .await
        .unwrap();

    let csv = export::to_csv(&outcome.record.items).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    // The utterance contains a comma, so the field must be quoted
    assert!(csv.contains(r#""hello, world""#));
    assert!(csv.contains("greet"));

    let tsv = export::to_tsv(&outcome.record.items).unwrap();
    assert_eq!(tsv.lines().count(), 2);
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_evaluation() {
    let server = FakeNluServer { script: vec![] };
    let store = MemoryBatchStore::new();
    let evaluator = evaluator(0.80);

    let blob = format!("text\n{}\n", "x".repeat(5 * 1024 * 1024));
    let err = evaluator
        .run(&server, &store, "huge", "data.csv", &blob, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    assert_eq!(evaluator.state(), BatchState::Failed);
}
