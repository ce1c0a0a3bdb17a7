//! # Polystat Core
//!
//! This crate provides the domain-agnostic analytics engine: the registry
//! mapping each analytics type to its queryable fields, the filter builder,
//! the aggregator, the chart and summary builders, and the storage trait
//! that backends implement.

pub mod aggregate;
pub mod chart;
pub mod engine;
pub mod error;
pub mod filter;
pub mod registry;
pub mod schema;
pub mod summary;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use aggregate::{AggregationVerb, NULL_GROUP, aggregate_rows};
pub use chart::{ChartData, ChartMetadata, ChartPoint, ChartType, PointMetadata};
pub use engine::{AggregationRequest, AnalyticsEngine};
pub use error::{AnalyticsError, AnalyticsResult, ErrorClass};
pub use filter::{Condition, FilterSpec, FilterValue, Predicate, parse_datetime};
pub use registry::{
    AnalyticsType, DomainConfig, DomainRegistry, FieldCatalog, FieldRole, FilterField,
    FilterKind, registry,
};
pub use schema::{EntityDefinition, Field, FieldDefault, FieldType};
pub use summary::{Breakdown, SummaryResult};
pub use traits::{InsertOutcome, StorageAdapter};
pub use types::{AggregationResult, GroupValue, Measure, Row, Value};
