//! Core data types for Polystat.
//!
//! This module defines the row representation shared with storage adapters
//! and the transient result objects produced by the aggregator.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A single cell value as stored by an adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Categorical or free-form text.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Naive timestamp (no timezone, as the source datasets carry).
    Timestamp(NaiveDateTime),
    /// Missing value.
    Null,
}

impl Value {
    /// Returns the numeric reading of this value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp, if this is a timestamp value.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Returns true for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the name of this value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S")),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A row of an entity, keyed by field name.
///
/// Missing fields read as [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    #[serde(flatten)]
    fields: HashMap<String, Value>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Gets a field value; absent fields are `Null`.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    /// Returns true if the field is present (even when null).
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over the populated fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

/// The outcome of one aggregation cell.
///
/// `NoData` means there was no value to aggregate, which is distinct from
/// an aggregate that happens to be zero. It serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Value(f64),
    NoData,
}

impl Measure {
    /// Returns the numeric value, or `None` for `NoData`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Measure::Value(v) => Some(*v),
            Measure::NoData => None,
        }
    }

    /// Returns true when there was nothing to aggregate.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Measure::NoData)
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map(Measure::Value).unwrap_or(Measure::NoData)
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Value(v) => serializer.serialize_f64(*v),
            Measure::NoData => serializer.serialize_none(),
        }
    }
}

/// One partition of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValue {
    /// The distinct value of the group_by field, rendered as text.
    pub group: String,
    /// The aggregate over the partition.
    pub value: Measure,
    /// Number of rows in the partition.
    pub row_count: usize,
}

/// The result of an aggregation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregationResult {
    /// Ungrouped: one value over every matching row.
    Scalar { value: Measure, row_count: usize },
    /// Grouped: one entry per distinct group_by value, in discovery order.
    Grouped { groups: Vec<GroupValue> },
}

impl AggregationResult {
    /// Returns the scalar value, if this result is ungrouped.
    pub fn value(&self) -> Option<Measure> {
        match self {
            AggregationResult::Scalar { value, .. } => Some(*value),
            AggregationResult::Grouped { .. } => None,
        }
    }

    /// Returns the groups, if this result is grouped.
    pub fn groups(&self) -> Option<&[GroupValue]> {
        match self {
            AggregationResult::Scalar { .. } => None,
            AggregationResult::Grouped { groups } => Some(groups),
        }
    }

    /// Total number of rows behind this result.
    pub fn row_count(&self) -> usize {
        match self {
            AggregationResult::Scalar { row_count, .. } => *row_count,
            AggregationResult::Grouped { groups } => groups.iter().map(|g| g.row_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_missing_field_is_null() {
        let row = Row::new().with("amount", 12.5);
        assert_eq!(row.get("amount").as_f64(), Some(12.5));
        assert!(row.get("quantity").is_null());
        assert!(!row.contains("quantity"));
    }

    #[test]
    fn test_measure_serializes_no_data_as_null() {
        let json = serde_json::to_value(Measure::NoData).unwrap();
        assert!(json.is_null());
        let json = serde_json::to_value(Measure::Value(3.5)).unwrap();
        assert_eq!(json, serde_json::json!(3.5));
    }

    #[test]
    fn test_value_display() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(Value::from(ts).to_string(), "2024-01-15T10:30:00");
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
