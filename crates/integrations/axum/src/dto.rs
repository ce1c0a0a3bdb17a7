//! Response bodies.

use polystat_core::aggregate::AggregationVerb;
use polystat_core::chart::{ChartPoint, ChartType};
use polystat_core::filter::FilterSpec;
use polystat_core::registry::AnalyticsType;
use polystat_core::summary::SummaryResult;
use polystat_core::types::AggregationResult;
use polystat_import::ImportReport;
use serde::Serialize;

/// `GET /api/v1/aggregate`
#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub analytics_type: AnalyticsType,
    pub aggregation_type: AggregationVerb,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// `value` + `row_count`, or `groups`.
    #[serde(flatten)]
    pub result: AggregationResult,
    pub filters_applied: FilterSpec,
}

/// `GET /api/v1/chart`
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub analytics_type: AnalyticsType,
    pub chart_type: ChartType,
    pub data: Vec<ChartPoint>,
    pub metadata: ChartResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ChartResponseMetadata {
    pub field: String,
    pub group_by: String,
    pub aggregation_type: AggregationVerb,
    pub total_points: usize,
    pub filters_applied: FilterSpec,
}

/// `GET /api/v1/metrics/summary`
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: SummaryResult,
    pub filters_applied: FilterSpec,
}

/// `POST /api/v1/import/{analytics_type}/{format}`
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub status: &'static str,
    pub analytics_type: AnalyticsType,
    pub records_imported: usize,
    pub skipped_duplicates: usize,
    pub message: String,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            status: "success",
            message: report.message(),
            analytics_type: report.analytics_type,
            records_imported: report.records_imported,
            skipped_duplicates: report.skipped_duplicates,
        }
    }
}
