//! # Polystat Memory Adapter
//!
//! An in-memory storage adapter for Polystat, used by the server for demo
//! data and by tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polystat_adapter_memory::MemoryAdapter;
//! use polystat_core::AnalyticsEngine;
//!
//! let adapter = Arc::new(MemoryAdapter::new());
//! let engine = AnalyticsEngine::new(adapter.clone());
//! ```

use async_trait::async_trait;
use polystat_core::error::AnalyticsResult;
use polystat_core::filter::Predicate;
use polystat_core::schema::EntityDefinition;
use polystat_core::traits::{InsertOutcome, StorageAdapter};
use polystat_core::types::Row;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows of every entity, keyed by entity name, in insertion order.
type Tables = Arc<RwLock<HashMap<String, Vec<Row>>>>;

/// In-memory storage adapter for Polystat.
///
/// Rows are kept per entity in insertion order. Data is lost when the
/// process exits. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    tables: Tables,
}

impl MemoryAdapter {
    /// Creates a new in-memory adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }

    /// Returns the number of rows stored for an entity.
    pub async fn row_count(&self, entity: &str) -> usize {
        self.tables
            .read()
            .await
            .get(entity)
            .map_or(0, Vec::len)
    }
}

/// Unique-field values already taken, as `(field, rendered value)`.
fn taken_keys(entity: &EntityDefinition, rows: &[Row]) -> HashSet<(String, String)> {
    let mut taken = HashSet::new();
    for row in rows {
        taken.extend(unique_keys(entity, row));
    }
    taken
}

fn unique_keys(entity: &EntityDefinition, row: &Row) -> Vec<(String, String)> {
    entity
        .unique_fields()
        .filter(|f| !row.get(&f.name).is_null())
        .map(|f| (f.name.clone(), row.get(&f.name).to_string()))
        .collect()
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    // ==================== Read Operations ====================

    async fn fetch_filtered(
        &self,
        entity: &EntityDefinition,
        predicate: &Predicate,
    ) -> AnalyticsResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(&entity.name) else {
            return Ok(Vec::new());
        };

        if predicate.is_identity() {
            return Ok(rows.clone());
        }
        Ok(rows.iter().filter(|r| predicate.matches(r)).cloned().collect())
    }

    async fn count_rows(&self, entity: &EntityDefinition) -> AnalyticsResult<usize> {
        Ok(self.row_count(&entity.name).await)
    }

    // ==================== Write Operations ====================

    async fn insert_rows(
        &self,
        entity: &EntityDefinition,
        rows: Vec<Row>,
    ) -> AnalyticsResult<InsertOutcome> {
        for row in &rows {
            entity.validate_row(row)?;
        }

        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.name.clone()).or_default();
        let mut taken = taken_keys(entity, table);
        let mut outcome = InsertOutcome::default();

        for row in rows {
            let keys = unique_keys(entity, &row);
            if keys.iter().any(|k| taken.contains(k)) {
                outcome.skipped += 1;
                continue;
            }
            taken.extend(keys);
            table.push(row);
            outcome.inserted += 1;
        }

        Ok(outcome)
    }
}
