//! Aggregation verbs and the in-memory aggregator.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::registry::{DomainConfig, FieldRole};
use crate::types::{AggregationResult, GroupValue, Measure, Row, Value};

/// Supported aggregation verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationVerb {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregationVerb {
    pub const ALL: [AggregationVerb; 5] = [
        AggregationVerb::Sum,
        AggregationVerb::Avg,
        AggregationVerb::Count,
        AggregationVerb::Min,
        AggregationVerb::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationVerb::Sum => "sum",
            AggregationVerb::Avg => "avg",
            AggregationVerb::Count => "count",
            AggregationVerb::Min => "min",
            AggregationVerb::Max => "max",
        }
    }
}

impl fmt::Display for AggregationVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationVerb {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                AnalyticsError::aggregation(format!(
                    "Unsupported aggregation type '{s}'. Must be one of: sum, avg, count, min, max"
                ))
            })
    }
}

/// Running state of one aggregation cell.
#[derive(Debug, Default, Clone)]
struct Accumulator {
    rows: usize,
    values: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn add(&mut self, field: &str, value: &Value) -> AnalyticsResult<()> {
        self.rows += 1;
        if value.is_null() {
            return Ok(());
        }
        let x = value.as_f64().ok_or_else(|| {
            AnalyticsError::aggregation(format!(
                "field '{field}' holds non-numeric {} value '{value}'",
                value.kind()
            ))
        })?;
        self.values += 1;
        self.sum += x;
        self.min = Some(self.min.map_or(x, |m| m.min(x)));
        self.max = Some(self.max.map_or(x, |m| m.max(x)));
        Ok(())
    }

    fn finish(&self, verb: AggregationVerb) -> Measure {
        match verb {
            AggregationVerb::Sum => Measure::Value(self.sum),
            AggregationVerb::Count => Measure::Value(self.rows as f64),
            AggregationVerb::Avg if self.values == 0 => Measure::NoData,
            AggregationVerb::Avg => Measure::Value(self.sum / self.values as f64),
            AggregationVerb::Min => self.min.into(),
            AggregationVerb::Max => self.max.into(),
        }
    }
}

/// Label of the partition holding rows whose group value is null.
pub const NULL_GROUP: &str = "null";

/// Aggregates `field` over `rows`, optionally partitioned by `group_by`.
///
/// Nulls are skipped by sum/avg/min/max; count counts every row. Over no
/// values, sum and count yield zero while avg/min/max yield `NoData`.
/// Groups appear in the order their first row was seen; null group values
/// form their own partition, labelled [`NULL_GROUP`].
pub fn aggregate_rows(
    config: &DomainConfig,
    verb: AggregationVerb,
    field: &str,
    group_by: Option<&str>,
    rows: &[Row],
) -> AnalyticsResult<AggregationResult> {
    config.validate_field(field, FieldRole::Aggregatable)?;

    let Some(group_field) = group_by else {
        let mut acc = Accumulator::default();
        for row in rows {
            acc.add(field, row.get(field))?;
        }
        return Ok(AggregationResult::Scalar {
            value: acc.finish(verb),
            row_count: acc.rows,
        });
    };

    config.validate_field(group_field, FieldRole::Groupable)?;

    // Null keys stay apart from a literal "null" text value.
    let mut partitions: IndexMap<Option<String>, Accumulator> = IndexMap::new();
    for row in rows {
        let key = row.get(group_field);
        let key = (!key.is_null()).then(|| key.to_string());
        partitions
            .entry(key)
            .or_default()
            .add(field, row.get(field))?;
    }

    let groups = partitions
        .into_iter()
        .map(|(key, acc)| GroupValue {
            group: key.unwrap_or_else(|| NULL_GROUP.to_string()),
            value: acc.finish(verb),
            row_count: acc.rows,
        })
        .collect();

    Ok(AggregationResult::Grouped { groups })
}
