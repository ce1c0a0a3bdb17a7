//! Summary builder: a fixed composition of canned aggregations.

use serde::Serialize;

use crate::aggregate::{AggregationVerb, aggregate_rows};
use crate::error::AnalyticsResult;
use crate::registry::{AnalyticsType, DomainConfig};
use crate::types::{GroupValue, Measure, Row};

/// Largest number of groups returned in a breakdown.
pub const BREAKDOWN_LIMIT: usize = 10;

/// Primary-metric totals per primary category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub field: String,
    pub groups: Vec<GroupValue>,
    pub distinct_groups: usize,
    pub truncated: bool,
}

/// Headline numbers for one analytics type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub analytics_type: AnalyticsType,
    pub count: usize,
    pub total: f64,
    pub average: Measure,
    pub primary_metric: String,
    pub breakdown: Breakdown,
}

/// Summarizes already filtered rows.
///
/// `total` and `average` are over the primary metric. The breakdown sums
/// the primary metric per primary category, largest first, capped at
/// [`BREAKDOWN_LIMIT`] groups.
pub fn summarize(config: &DomainConfig, rows: &[Row]) -> AnalyticsResult<SummaryResult> {
    let metric = config.primary_metric.as_str();
    let category = config.primary_category.as_str();

    let total = aggregate_rows(config, AggregationVerb::Sum, metric, None, rows)?;
    let average = aggregate_rows(config, AggregationVerb::Avg, metric, None, rows)?;
    let grouped = aggregate_rows(config, AggregationVerb::Sum, metric, Some(category), rows)?;

    let mut groups = grouped.groups().map(<[_]>::to_vec).unwrap_or_default();
    let distinct_groups = groups.len();
    // Stable: ties keep discovery order.
    groups.sort_by(|a, b| {
        let a = a.value.as_f64().unwrap_or(0.0);
        let b = b.value.as_f64().unwrap_or(0.0);
        b.total_cmp(&a)
    });
    groups.truncate(BREAKDOWN_LIMIT);

    Ok(SummaryResult {
        analytics_type: config.analytics_type,
        count: rows.len(),
        total: total.value().and_then(|m| m.as_f64()).unwrap_or(0.0),
        average: average.value().unwrap_or(Measure::NoData),
        primary_metric: metric.to_string(),
        breakdown: Breakdown {
            field: category.to_string(),
            truncated: distinct_groups > groups.len(),
            distinct_groups,
            groups,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    fn order(cuisine: &str, total: f64) -> Row {
        Row::new()
            .with("cuisine_type", cuisine)
            .with("total_amount", total)
    }

    #[test]
    fn test_summary_of_food_orders() {
        let config = registry().resolve(AnalyticsType::FoodDelivery).unwrap();
        let rows = vec![order("Thai", 10.0), order("Pizza", 30.0), order("Thai", 5.0)];
        let summary = summarize(config, &rows).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.total, 45.0);
        assert_eq!(summary.average, Measure::Value(15.0));
        assert_eq!(summary.primary_metric, "total_amount");
        assert_eq!(summary.breakdown.field, "cuisine_type");
        assert_eq!(summary.breakdown.groups[0].group, "Pizza");
        assert_eq!(summary.breakdown.groups[1].value, Measure::Value(15.0));
        assert!(!summary.breakdown.truncated);
    }

    #[test]
    fn test_empty_summary() {
        let config = registry().resolve(AnalyticsType::Saas).unwrap();
        let summary = summarize(config, &[]).unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.average, Measure::NoData);
        assert!(summary.breakdown.groups.is_empty());
    }

    #[test]
    fn test_breakdown_is_capped() {
        let config = registry().resolve(AnalyticsType::FoodDelivery).unwrap();
        let rows: Vec<Row> = (0..BREAKDOWN_LIMIT + 3)
            .map(|i| order(&format!("cuisine-{i}"), i as f64))
            .collect();
        let summary = summarize(config, &rows).unwrap();
        assert_eq!(summary.breakdown.groups.len(), BREAKDOWN_LIMIT);
        assert_eq!(summary.breakdown.distinct_groups, BREAKDOWN_LIMIT + 3);
        assert!(summary.breakdown.truncated);
        assert_eq!(summary.breakdown.groups[0].group, "cuisine-12");
    }
}
