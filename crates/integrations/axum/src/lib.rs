//! # Polystat Axum Integration
//!
//! This crate provides the HTTP surface of Polystat on Axum, including:
//! - Route mounting for aggregation, chart, summary, field discovery and import
//! - Query-string decoding into engine requests
//! - Error to status-code mapping
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polystat_adapter_memory::MemoryAdapter;
//! use polystat_axum::analytics_routes;
//!
//! let adapter = Arc::new(MemoryAdapter::new());
//! let app: Router = analytics_routes(adapter);
//! ```

mod dto;
mod error;
mod extractor;
mod routes;

pub use dto::{
    AggregateResponse, ChartResponse, ChartResponseMetadata, ImportResponse, SummaryResponse,
};
pub use error::ApiError;
pub use extractor::{AnalyticsQuery, RESERVED_PARAMS};
pub use routes::analytics_routes;
