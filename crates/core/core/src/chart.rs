//! Chart formatting of grouped aggregation results.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{AggregationResult, Measure};

/// Rendering hint for the client. Does not change the point shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            other => Err(AnalyticsError::InvalidChartType {
                value: other.to_string(),
            }),
        }
    }
}

/// Auxiliary data behind a chart point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMetadata {
    pub row_count: usize,
}

/// One labelled value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Measure,
    pub metadata: PointMetadata,
}

/// Echo of what the chart was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMetadata {
    pub field: String,
    pub group_by: String,
    pub total_points: usize,
}

/// A formatted chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub chart_type: ChartType,
    pub data: Vec<ChartPoint>,
    pub metadata: ChartMetadata,
}

/// Reshapes a grouped result into chart points, one per group.
///
/// Ungrouped results fail with `ChartRequiresGrouping`.
pub fn format(
    chart_type: ChartType,
    result: &AggregationResult,
    field: &str,
    group_by: &str,
) -> AnalyticsResult<ChartData> {
    let groups = result
        .groups()
        .ok_or(AnalyticsError::ChartRequiresGrouping)?;

    let data: Vec<ChartPoint> = groups
        .iter()
        .map(|g| ChartPoint {
            label: g.group.clone(),
            value: g.value,
            metadata: PointMetadata {
                row_count: g.row_count,
            },
        })
        .collect();

    Ok(ChartData {
        chart_type,
        metadata: ChartMetadata {
            field: field.to_string(),
            group_by: group_by.to_string(),
            total_points: data.len(),
        },
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupValue;

    #[test]
    fn test_scalar_result_is_rejected() {
        let result = AggregationResult::Scalar {
            value: Measure::Value(1.0),
            row_count: 1,
        };
        let err = format(ChartType::Bar, &result, "amount", "category").unwrap_err();
        assert!(matches!(err, AnalyticsError::ChartRequiresGrouping));
    }

    #[test]
    fn test_chart_type_does_not_change_points() {
        let result = AggregationResult::Grouped {
            groups: vec![
                GroupValue {
                    group: "Thai".into(),
                    value: Measure::Value(42.0),
                    row_count: 3,
                },
                GroupValue {
                    group: "Pizza".into(),
                    value: Measure::NoData,
                    row_count: 1,
                },
            ],
        };
        let bar = format(ChartType::Bar, &result, "total_amount", "cuisine_type").unwrap();
        let pie = format(ChartType::Pie, &result, "total_amount", "cuisine_type").unwrap();
        assert_eq!(bar.data, pie.data);
        assert_eq!(bar.metadata.total_points, 2);
        assert_eq!(bar.data[0].label, "Thai");
        assert_eq!(bar.data[0].metadata.row_count, 3);
    }

    #[test]
    fn test_parse_chart_type() {
        assert_eq!("line".parse::<ChartType>().unwrap(), ChartType::Line);
        assert!(matches!(
            "donut".parse::<ChartType>(),
            Err(AnalyticsError::InvalidChartType { .. })
        ));
    }
}
