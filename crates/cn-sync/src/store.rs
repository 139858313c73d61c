//! Persistent storage for canvas records.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use cn_core::record::CanvasRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Dashboard entry for one stored canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSummary {
    pub id: String,
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

impl From<&CanvasRecord> for CanvasSummary {
    fn from(record: &CanvasRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            last_modified: record.last_modified,
        }
    }
}

/// Where canvases live. `save` is an idempotent upsert keyed by record id.
pub trait DocumentStore: Send + Sync {
    fn save(&self, record: &CanvasRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn load(&self, id: &str) -> impl Future<Output = Result<CanvasRecord, StoreError>> + Send;

    /// Every stored canvas, most recently modified first.
    fn list(&self) -> impl Future<Output = Result<Vec<CanvasSummary>, StoreError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

const CHANGE_BUFFER: usize = 64;

/// In-process store holding serialized records, keyed by canvas id.
/// Successful saves are broadcast to every [`subscribe`](Self::subscribe)r.
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<CanvasRecord>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            records: Mutex::new(HashMap::new()),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CanvasRecord> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    async fn save(&self, record: &CanvasRecord) -> Result<(), StoreError> {
        let json = record.to_json()?;
        self.records().insert(record.id.clone(), json);
        log::debug!("stored canvas {}", record.id);
        // No subscribers is fine.
        let _ = self.changes.send(record.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<CanvasRecord, StoreError> {
        let json = self
            .records()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(CanvasRecord::from_json(&json)?)
    }

    async fn list(&self) -> Result<Vec<CanvasSummary>, StoreError> {
        let mut summaries: Vec<CanvasSummary> = self
            .records()
            .iter()
            .filter_map(|(id, json)| match CanvasRecord::from_json(json) {
                Ok(record) => Some(CanvasSummary::from(&record)),
                Err(err) => {
                    log::warn!("skipping unreadable canvas {id}: {err}");
                    None
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
