//! The analytics engine.
//!
//! [`AnalyticsEngine`] is what transport layers call. Each operation
//! resolves and validates the whole request against the registry, builds
//! the filter predicate, and only then fetches rows from storage, exactly
//! once.

use std::sync::Arc;

use tracing::{debug, error};

use crate::aggregate::{AggregationVerb, aggregate_rows};
use crate::chart::{self, ChartData, ChartType};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::filter::{self, FilterSpec, FilterValue, Predicate};
use crate::registry::{self, AnalyticsType, DomainConfig, DomainRegistry, FieldCatalog, FieldRole};
use crate::summary::{self, SummaryResult};
use crate::traits::StorageAdapter;
use crate::types::{AggregationResult, Row};

/// A fully typed aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub analytics_type: AnalyticsType,
    pub verb: AggregationVerb,
    pub field: String,
    pub group_by: Option<String>,
    pub filters: FilterSpec,
}

impl AggregationRequest {
    /// Creates an ungrouped, unfiltered request.
    pub fn new(analytics_type: AnalyticsType, verb: AggregationVerb, field: impl Into<String>) -> Self {
        Self {
            analytics_type,
            verb,
            field: field.into(),
            group_by: None,
            filters: FilterSpec::new(),
        }
    }

    /// Parses the identifiers of a request.
    ///
    /// The analytics type is checked first, so an unknown type is reported
    /// even when the verb is also wrong.
    pub fn parse(analytics_type: &str, verb: &str, field: &str) -> AnalyticsResult<Self> {
        let analytics_type = analytics_type.parse()?;
        let verb = verb.parse()?;
        Ok(Self::new(analytics_type, verb, field))
    }

    /// Partitions the result by a groupable field.
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Adds one filter.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(key, value);
        self
    }

    /// Replaces the filters.
    pub fn filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }
}

/// Entry point for every analytics query.
#[derive(Clone)]
pub struct AnalyticsEngine {
    storage: Arc<dyn StorageAdapter>,
    registry: Arc<DomainRegistry>,
}

impl AnalyticsEngine {
    /// Creates an engine over the built-in registry.
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self::with_registry(storage, registry::registry().clone())
    }

    /// Creates an engine over a custom registry.
    pub fn with_registry(storage: Arc<dyn StorageAdapter>, registry: DomainRegistry) -> Self {
        Self {
            storage,
            registry: Arc::new(registry),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    /// Runs an aggregation.
    pub async fn aggregate(&self, request: &AggregationRequest) -> AnalyticsResult<AggregationResult> {
        let (config, predicate) = self.prepare(request)?;
        debug!(
            analytics_type = %request.analytics_type,
            verb = %request.verb,
            field = %request.field,
            group_by = ?request.group_by,
            conditions = predicate.conditions().len(),
            "aggregate"
        );

        let rows = self.fetch(config, &predicate).await?;
        aggregate_rows(
            config,
            request.verb,
            &request.field,
            request.group_by.as_deref(),
            &rows,
        )
    }

    /// Runs a grouped aggregation and formats it as chart points.
    pub async fn chart(
        &self,
        chart_type: ChartType,
        request: &AggregationRequest,
    ) -> AnalyticsResult<ChartData> {
        let (config, predicate) = self.prepare(request)?;
        let group_by = request
            .group_by
            .as_deref()
            .ok_or(AnalyticsError::ChartRequiresGrouping)?;
        debug!(
            analytics_type = %request.analytics_type,
            chart_type = %chart_type,
            verb = %request.verb,
            field = %request.field,
            group_by,
            "chart"
        );

        let rows = self.fetch(config, &predicate).await?;
        let result = aggregate_rows(config, request.verb, &request.field, Some(group_by), &rows)?;
        chart::format(chart_type, &result, &request.field, group_by)
    }

    /// Summarizes the rows matching `filters`.
    pub async fn summary(
        &self,
        analytics_type: AnalyticsType,
        filters: &FilterSpec,
    ) -> AnalyticsResult<SummaryResult> {
        let config = self.registry.resolve(analytics_type)?;
        let predicate = filter::build(config, filters)?;
        debug!(%analytics_type, conditions = predicate.conditions().len(), "summary");

        let rows = self.fetch(config, &predicate).await?;
        summary::summarize(config, &rows)
    }

    /// Returns the queryable field sets of an analytics type.
    pub fn list_fields(&self, analytics_type: AnalyticsType) -> AnalyticsResult<FieldCatalog> {
        Ok(self.registry.resolve(analytics_type)?.catalog())
    }

    /// Validates a request completely and builds its predicate.
    fn prepare(&self, request: &AggregationRequest) -> AnalyticsResult<(&DomainConfig, Predicate)> {
        let config = self.registry.resolve(request.analytics_type)?;
        config.validate_field(&request.field, FieldRole::Aggregatable)?;
        if let Some(group_by) = &request.group_by {
            config.validate_field(group_by, FieldRole::Groupable)?;
        }
        let predicate = filter::build(config, &request.filters)?;
        Ok((config, predicate))
    }

    async fn fetch(&self, config: &DomainConfig, predicate: &Predicate) -> AnalyticsResult<Vec<Row>> {
        self.storage
            .fetch_filtered(&config.entity, predicate)
            .await
            .inspect_err(|e| {
                error!(entity = %config.entity.name, error = %e, "storage fetch failed");
            })
    }
}
