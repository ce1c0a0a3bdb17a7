//! Route mounting for the analytics API.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use polystat_core::aggregate::AggregationVerb;
use polystat_core::engine::AnalyticsEngine;
use polystat_core::registry::{AnalyticsType, FieldCatalog};
use polystat_core::traits::StorageAdapter;
use polystat_import::{ImportFormat, Importer};
use serde_json::json;
use std::sync::Arc;

use crate::dto::{
    AggregateResponse, ChartResponse, ChartResponseMetadata, ImportResponse, SummaryResponse,
};
use crate::error::ApiError;
use crate::extractor::AnalyticsQuery;

/// Creates an Axum router with every analytics route.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .merge(analytics_routes(adapter))
///     .layer(TraceLayer::new_for_http());
/// ```
pub fn analytics_routes<S>(storage: Arc<dyn StorageAdapter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = AnalyticsState {
        engine: AnalyticsEngine::new(storage.clone()),
        importer: Importer::new(storage),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/v1/aggregate", get(aggregate_handler))
        .route("/api/v1/chart", get(chart_handler))
        .route("/api/v1/metrics/summary", get(summary_handler))
        .route("/api/v1/fields", get(fields_handler))
        .route(
            "/api/v1/import/{analytics_type}/{format}",
            post(import_handler),
        )
        .with_state(state)
}

/// Shared state for analytics routes.
#[derive(Clone)]
struct AnalyticsState {
    engine: AnalyticsEngine,
    importer: Importer,
}

async fn root_handler() -> Json<serde_json::Value> {
    let types: serde_json::Map<String, serde_json::Value> = AnalyticsType::ALL
        .iter()
        .map(|t| (t.to_string(), json!(t.description())))
        .collect();

    Json(json!({
        "message": "Multi-Domain Analytics Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "supported_analytics_types": types,
        "endpoints": {
            "aggregations": "/api/v1/aggregate",
            "chart_data": "/api/v1/chart",
            "metrics_summary": "/api/v1/metrics/summary",
            "fields": "/api/v1/fields",
            "import": "/api/v1/import/{analytics_type}/{csv|json}",
            "health": "/health"
        }
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "service": "analytics-backend"}))
}

async fn aggregate_handler(
    State(state): State<AnalyticsState>,
    query: AnalyticsQuery,
) -> Result<Json<AggregateResponse>, ApiError> {
    let request = query.aggregation_request(None)?;
    let result = state.engine.aggregate(&request).await?;

    Ok(Json(AggregateResponse {
        analytics_type: request.analytics_type,
        aggregation_type: request.verb,
        field: request.field,
        group_by: request.group_by,
        result,
        filters_applied: request.filters.applied(),
    }))
}

async fn chart_handler(
    State(state): State<AnalyticsState>,
    query: AnalyticsQuery,
) -> Result<Json<ChartResponse>, ApiError> {
    let request = query.aggregation_request(Some(AggregationVerb::Sum))?;
    let chart_type = query.chart_type()?;
    let chart = state.engine.chart(chart_type, &request).await?;

    Ok(Json(ChartResponse {
        analytics_type: request.analytics_type,
        chart_type: chart.chart_type,
        data: chart.data,
        metadata: ChartResponseMetadata {
            field: chart.metadata.field,
            group_by: chart.metadata.group_by,
            aggregation_type: request.verb,
            total_points: chart.metadata.total_points,
            filters_applied: request.filters.applied(),
        },
    }))
}

async fn summary_handler(
    State(state): State<AnalyticsState>,
    query: AnalyticsQuery,
) -> Result<Json<SummaryResponse>, ApiError> {
    let analytics_type = query.analytics_type()?;
    let filters = query.filters();
    let summary = state.engine.summary(analytics_type, &filters).await?;

    Ok(Json(SummaryResponse {
        summary,
        filters_applied: filters.applied(),
    }))
}

async fn fields_handler(
    State(state): State<AnalyticsState>,
    query: AnalyticsQuery,
) -> Result<Json<FieldCatalog>, ApiError> {
    let analytics_type = query.analytics_type()?;
    Ok(Json(state.engine.list_fields(analytics_type)?))
}

async fn import_handler(
    State(state): State<AnalyticsState>,
    Path((analytics_type, format)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    let analytics_type: AnalyticsType = analytics_type.parse()?;
    let format: ImportFormat = format.parse()?;
    let report = state.importer.import(analytics_type, format, &body).await?;
    Ok(Json(report.into()))
}
