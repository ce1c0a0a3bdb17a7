//! Core traits for Polystat.
//!
//! This module defines the interface storage backends implement to serve
//! rows to the engine and accept rows from import and seeding.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AnalyticsResult;
use crate::filter::Predicate;
use crate::schema::EntityDefinition;
use crate::types::Row;

/// What happened to a batch of inserted rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// Rows written.
    pub inserted: usize,
    /// Rows skipped because a unique field value already existed.
    pub skipped: usize,
}

/// Trait for storage adapters (database backends).
///
/// Adapters hold the rows of every entity. The engine only reads through
/// [`fetch_filtered`](StorageAdapter::fetch_filtered); writes come from bulk
/// import and demo seeding.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    // ==================== Read Operations ====================

    /// Returns the rows of `entity` matching `predicate`, in insertion order.
    async fn fetch_filtered(
        &self,
        entity: &EntityDefinition,
        predicate: &Predicate,
    ) -> AnalyticsResult<Vec<Row>>;

    /// Counts all rows of `entity`.
    async fn count_rows(&self, entity: &EntityDefinition) -> AnalyticsResult<usize> {
        // Default implementation - adapters can override for efficiency
        Ok(self.fetch_filtered(entity, &Predicate::all()).await?.len())
    }

    // ==================== Write Operations ====================

    /// Inserts rows into `entity`.
    ///
    /// Every row is validated against the entity before anything is written.
    /// A row whose unique field value is already stored, or repeated earlier
    /// in the same batch, is skipped.
    async fn insert_rows(
        &self,
        entity: &EntityDefinition,
        rows: Vec<Row>,
    ) -> AnalyticsResult<InsertOutcome>;
}
