//! Batch Aggregator
//!
//! Folds a sequence of classification results into summary statistics.

use crate::prediction::{BatchSummary, ClassificationResult};

/// Summarize a batch of classification results.
///
/// Pure and order-independent: permuting the input never changes the output.
/// The recognition rate is left unrounded; rounding is a presentation concern.
/// The latency mean only covers items with a positive recorded latency, so
/// corrupt transport timings (zero or negative) cannot skew it.
pub fn summarize(results: &[ClassificationResult], threshold: f64) -> BatchSummary {
    let total_count = results.len();
    let recognized_count = results.iter().filter(|r| r.recognized).count();

    let recognition_rate_pct = if total_count == 0 {
        0.0
    } else {
        100.0 * recognized_count as f64 / total_count as f64
    };

    let timings: Vec<u64> = results
        .iter()
        .filter_map(|r| r.response_time_ms)
        .filter(|&ms| ms > 0)
        .collect();

    let average_response_time_ms = if timings.is_empty() {
        None
    } else {
        Some(timings.iter().sum::<u64>() as f64 / timings.len() as f64)
    };

    BatchSummary {
        total_count,
        recognized_count,
        recognition_rate_pct,
        threshold,
        average_response_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::Prediction;

    fn result(recognized: bool, response_time_ms: Option<u64>) -> ClassificationResult {
        ClassificationResult {
            text: "hello".to_string(),
            prediction: Prediction::empty(),
            threshold: 0.8,
            recognized,
            response_time_ms,
            error: None,
        }
    }

    #[test]
    fn test_empty_batch() {
        let summary = summarize(&[], 0.8);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.recognized_count, 0);
        assert_eq!(summary.recognition_rate_pct, 0.0);
        assert_eq!(summary.average_response_time_ms, None);
    }

    #[test]
    fn test_counts_and_rate() {
        let results = vec![
            result(true, Some(100)),
            result(false, Some(200)),
            result(false, Some(300)),
        ];
        let summary = summarize(&results, 0.8);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.recognized_count, 1);
        assert!((summary.recognition_rate_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.average_response_time_ms, Some(200.0));
    }

    #[test]
    fn test_zero_and_missing_latencies_excluded_from_mean() {
        let results = vec![
            result(true, Some(0)),
            result(true, None),
            result(false, Some(150)),
        ];
        let summary = summarize(&results, 0.8);
        assert_eq!(summary.average_response_time_ms, Some(150.0));
    }

    #[test]
    fn test_all_latencies_missing_yields_none() {
        let results = vec![result(true, None), result(false, Some(0))];
        assert_eq!(summarize(&results, 0.8).average_response_time_ms, None);
    }

    #[test]
    fn test_permutation_invariance() {
        let a = result(true, Some(100));
        let b = result(false, Some(250));
        let c = result(true, None);
        let d = result(false, Some(50));

        let forward = summarize(&[a.clone(), b.clone(), c.clone(), d.clone()], 0.8);
        let reversed = summarize(&[d, c, b, a], 0.8);
        assert_eq!(forward, reversed);
    }
}
