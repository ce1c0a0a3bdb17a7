//! Query-string extractor for analytics handlers.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use polystat_core::aggregate::AggregationVerb;
use polystat_core::chart::ChartType;
use polystat_core::engine::AggregationRequest;
use polystat_core::filter::FilterSpec;
use polystat_core::registry::AnalyticsType;
use std::collections::HashMap;

use crate::error::ApiError;

/// Query parameters with a fixed meaning. Every other parameter is a filter.
pub const RESERVED_PARAMS: &[&str] = &[
    "analytics_type",
    "aggregation_type",
    "field",
    "group_by",
    "chart_type",
];

const DEFAULT_ANALYTICS_TYPE: &str = "sales";

/// The decoded query string of an analytics request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(query: AnalyticsQuery) -> Result<String, ApiError> {
///     Ok(query.analytics_type()?.to_string())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalyticsQuery {
    params: HashMap<String, String>,
}

impl AnalyticsQuery {
    /// Creates a query from decoded parameters.
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &'static str) -> Result<&str, ApiError> {
        self.get(key).ok_or(ApiError::MissingParameter(key))
    }

    /// The analytics type; `sales` when absent.
    pub fn analytics_type(&self) -> Result<AnalyticsType, ApiError> {
        let raw = self.get("analytics_type").unwrap_or(DEFAULT_ANALYTICS_TYPE);
        Ok(raw.parse()?)
    }

    /// The chart type; `bar` when absent.
    pub fn chart_type(&self) -> Result<ChartType, ApiError> {
        Ok(self.get("chart_type").unwrap_or("bar").parse()?)
    }

    /// Every non-reserved parameter, as a filter spec.
    pub fn filters(&self) -> FilterSpec {
        self.params
            .iter()
            .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Builds an aggregation request.
    ///
    /// `aggregation_type` falls back to `default_verb` when given, and is
    /// required otherwise. `field` is always required.
    pub fn aggregation_request(
        &self,
        default_verb: Option<AggregationVerb>,
    ) -> Result<AggregationRequest, ApiError> {
        let analytics_type = self.analytics_type()?;
        let verb = match (self.get("aggregation_type"), default_verb) {
            (Some(raw), _) => raw.parse::<AggregationVerb>()?,
            (None, Some(verb)) => verb,
            (None, None) => return Err(ApiError::MissingParameter("aggregation_type")),
        };
        let field = self.require("field")?;

        let mut request =
            AggregationRequest::new(analytics_type, verb, field).filters(self.filters());
        if let Some(group_by) = self.get("group_by") {
            request = request.group_by(group_by);
        }
        Ok(request)
    }
}

impl<S> FromRequestParts<S> for AnalyticsQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self::new(params))
    }
}
