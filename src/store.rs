//! In-memory record store
//!
//! Records keep their id for life; deleting one never renumbers the others.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::Serialize;

use crate::builder::CultureRecordBuilder;
use crate::error::{CultureError, Result};
use crate::record::{CultureRecord, CultureUpdate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredCulture {
    pub id: u64,
    #[serde(flatten)]
    pub record: CultureRecord,
}

/// Row geometry of a stored record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub id: u64,
    pub strategy: &'static str,
    pub row_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_length_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_linear_meters: Option<f64>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    records: BTreeMap<u64, CultureRecord>,
}

#[derive(Debug, Default)]
pub struct CultureStore {
    inner: RwLock<Inner>,
}

impl CultureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: CultureRecord) -> StoredCulture {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.insert(id, record.clone());
        tracing::debug!("Stored culture {}", id);
        StoredCulture { id, record }
    }

    /// All records in insertion order
    pub fn list(&self) -> Vec<StoredCulture> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .records
            .iter()
            .map(|(id, record)| StoredCulture { id: *id, record: record.clone() })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: u64) -> Result<StoredCulture> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .records
            .get(&id)
            .map(|record| StoredCulture { id, record: record.clone() })
            .ok_or(CultureError::NotFound(id))
    }

    /// Revalidate with `update` and replace the stored record.
    ///
    /// An empty update is rejected.
    pub fn update(&self, builder: &CultureRecordBuilder, id: u64, update: CultureUpdate) -> Result<StoredCulture> {
        if update.is_empty() {
            return Err(CultureError::invalid("no fields to update"));
        }

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let current = inner.records.get(&id).ok_or(CultureError::NotFound(id))?;
        let updated = builder.revalidate(current, update)?;
        inner.records.insert(id, updated.clone());
        tracing::info!("Updated culture {}", id);
        Ok(StoredCulture { id, record: updated })
    }

    pub fn delete(&self, id: u64) -> Result<StoredCulture> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let record = inner.records.remove(&id).ok_or(CultureError::NotFound(id))?;
        tracing::info!("Deleted culture {}", id);
        Ok(StoredCulture { id, record })
    }

    /// Recompute the row count of a stored record
    pub fn compute_lines(&self, id: u64) -> Result<LineSummary> {
        let stored = self.get(id)?;
        let record = &stored.record;
        Ok(LineSummary {
            id,
            strategy: record.strategy.id(),
            row_count: CultureRecordBuilder::compute_rows(record),
            row_length_estimate: record.row_length_estimate,
            total_linear_meters: record.total_linear_meters,
        })
    }
}
