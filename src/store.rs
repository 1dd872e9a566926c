//! Storage seam for persisted batch runs.
//!
//! Durable storage is an external collaborator; this module defines the trait
//! the evaluator hands completed records to, plus an in-memory implementation
//! backing the CLI and tests.

use crate::error::{ConsoleError, Result};
use crate::prediction::{BatchRecord, BatchSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// One row in a batch listing, without the per-item payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummaryRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub test_name: String,
    pub summary: BatchSummary,
}

/// Dashboard aggregation over every stored batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub batch_count: usize,
    pub total_items: usize,
    pub total_recognized: usize,
    /// 100 * total_recognized / total_items, 0 when nothing is stored.
    pub overall_recognition_rate_pct: f64,
}

pub trait BatchStore: Send + Sync {
    fn persist_batch(&self, record: &BatchRecord) -> Result<Uuid>;
    fn fetch_batch(&self, id: Uuid) -> Result<BatchRecord>;
    /// Newest first. `page` is zero-based.
    fn list_batches(&self, page: usize, page_size: usize) -> Result<Vec<BatchSummaryRow>>;
}

/// Fold stored batch summaries into overall dashboard totals.
pub fn dashboard_totals(rows: &[BatchSummaryRow]) -> DashboardTotals {
    let total_items: usize = rows.iter().map(|r| r.summary.total_count).sum();
    let total_recognized: usize = rows.iter().map(|r| r.summary.recognized_count).sum();
    let overall_recognition_rate_pct = if total_items == 0 {
        0.0
    } else {
        100.0 * total_recognized as f64 / total_items as f64
    };

    DashboardTotals {
        batch_count: rows.len(),
        total_items,
        total_recognized,
        overall_recognition_rate_pct,
    }
}

/// In-memory store. Records are immutable once persisted.
#[derive(Default)]
pub struct MemoryBatchStore {
    records: Mutex<Vec<BatchRecord>>,
}

impl MemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchStore for MemoryBatchStore {
    fn persist_batch(&self, record: &BatchRecord) -> Result<Uuid> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| ConsoleError::Persistence("batch store lock poisoned".to_string()))?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(ConsoleError::Persistence(format!(
                "batch {} already persisted",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(record.id)
    }

    fn fetch_batch(&self, id: Uuid) -> Result<BatchRecord> {
        let records = self
            .records
            .lock()
            .map_err(|_| ConsoleError::Persistence("batch store lock poisoned".to_string()))?;
        records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ConsoleError::Persistence(format!("batch {} not found", id)))
    }

    fn list_batches(&self, page: usize, page_size: usize) -> Result<Vec<BatchSummaryRow>> {
        let records = self
            .records
            .lock()
            .map_err(|_| ConsoleError::Persistence("batch store lock poisoned".to_string()))?;
        let mut rows: Vec<BatchSummaryRow> = records
            .iter()
            .map(|r| BatchSummaryRow {
                id: r.id,
                created_at: r.created_at,
                test_name: r.test_name.clone(),
                summary: r.summary.clone(),
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .collect())
    }
}
