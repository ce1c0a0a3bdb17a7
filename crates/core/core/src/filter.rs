//! Filter specs and the predicates built from them.
//!
//! A [`FilterSpec`] is the raw key → value mapping a caller supplies. It is
//! validated against a [`DomainConfig`] and turned into a [`Predicate`], a
//! conjunction of conditions that storage adapters evaluate per row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::registry::{DomainConfig, FieldRole, FilterKind};
use crate::schema::FieldType;
use crate::types::{Row, Value};

/// Date-time formats tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

/// Date-only formats, read as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parses a date string in any of the accepted formats.
///
/// Date-only values resolve to midnight. RFC 3339 values with an offset
/// are converted to UTC.
pub fn parse_datetime(raw: &str) -> AnalyticsResult<NaiveDateTime> {
    let raw = raw.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return Ok(parsed.and_time(NaiveTime::MIN));
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|_| AnalyticsError::unparseable_date(raw))
}

// ==================== Filter Spec ====================

/// A caller-supplied filter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
}

impl FilterValue {
    /// Empty text carries no constraint and is ignored.
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "{s}"),
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(value: NaiveDateTime) -> Self {
        FilterValue::Timestamp(value)
    }
}

/// Filter key → value mapping, keyed in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterSpec {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries that constrain rows (empty values dropped).
    pub fn applied(&self) -> FilterSpec {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ==================== Predicate ====================

/// One comparison against a row field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field == value`
    Equals { field: String, value: Value },
    /// `field >= bound`
    AtLeast { field: String, bound: NaiveDateTime },
    /// `field <= bound`
    AtMost { field: String, bound: NaiveDateTime },
}

impl Condition {
    /// Null fields never match.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::Equals { field, value } => values_equal(row.get(field), value),
            Condition::AtLeast { field, bound } => row
                .get(field)
                .as_timestamp()
                .is_some_and(|ts| ts >= *bound),
            Condition::AtMost { field, bound } => row
                .get(field)
                .as_timestamp()
                .is_some_and(|ts| ts <= *bound),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. }
            | Condition::AtLeast { field, .. }
            | Condition::AtMost { field, .. } => field,
        }
    }
}

fn values_equal(row_value: &Value, expected: &Value) -> bool {
    match (row_value.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => !row_value.is_null() && row_value == expected,
    }
}

/// A conjunction of conditions; the empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// The identity predicate.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a condition.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    pub fn is_identity(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Validates a filter spec and builds its predicate.
///
/// Every key must be filterable for the domain. Empty values are ignored.
/// Values are coerced to the target field's type; range keys must hold a
/// parseable date.
pub fn build(config: &DomainConfig, spec: &FilterSpec) -> AnalyticsResult<Predicate> {
    let mut predicate = Predicate::all();

    for (key, value) in spec.iter() {
        config.validate_field(key, FieldRole::Filterable)?;
        let Some(filter) = config.filter_field(key) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        let condition = match filter.kind {
            FilterKind::Equality => {
                let field_type = config.field_type(&filter.field).ok_or_else(|| {
                    AnalyticsError::config(format!(
                        "filter '{key}' targets unknown field '{}'",
                        filter.field
                    ))
                })?;
                Condition::Equals {
                    field: filter.field.clone(),
                    value: coerce(key, value, field_type)?,
                }
            }
            FilterKind::RangeStart => Condition::AtLeast {
                field: filter.field.clone(),
                bound: date_bound(key, value)?,
            },
            FilterKind::RangeEnd => Condition::AtMost {
                field: filter.field.clone(),
                bound: date_bound(key, value)?,
            },
        };
        predicate = predicate.and(condition);
    }

    Ok(predicate)
}

fn date_bound(key: &str, value: &FilterValue) -> AnalyticsResult<NaiveDateTime> {
    match value {
        FilterValue::Text(s) => parse_datetime(s),
        FilterValue::Timestamp(ts) => Ok(*ts),
        FilterValue::Number(_) => Err(invalid_value(key, value, "expected a date")),
    }
}

fn coerce(key: &str, value: &FilterValue, field_type: FieldType) -> AnalyticsResult<Value> {
    match (field_type, value) {
        (_, FilterValue::Text(s)) => field_type
            .parse(s)
            .map_err(|reason| invalid_value(key, value, &reason)),
        (FieldType::Text, FilterValue::Number(n)) => Ok(Value::Text(value_text(*n))),
        (FieldType::Integer, FilterValue::Number(n)) if n.fract() == 0.0 => {
            Ok(Value::Integer(*n as i64))
        }
        (FieldType::Float, FilterValue::Number(n)) => Ok(Value::Float(*n)),
        (FieldType::Timestamp, FilterValue::Timestamp(ts)) => Ok(Value::Timestamp(*ts)),
        _ => Err(invalid_value(
            key,
            value,
            &format!("cannot compare with a {field_type} field"),
        )),
    }
}

fn value_text(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn invalid_value(key: &str, value: &FilterValue, reason: &str) -> AnalyticsError {
    AnalyticsError::InvalidFilterValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AnalyticsType, registry};

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = ts(2024, 1, 15, 10, 30, 0);
        for raw in [
            "2024-01-15 10:30:00",
            "2024-01-15T10:30:00",
            "15/01/2024 10:30:00",
            "15-01-2024 10:30:00",
            "2024-01-15T10:30:00Z",
        ] {
            assert_eq!(parse_datetime(raw).unwrap(), expected, "{raw}");
        }
        assert_eq!(
            parse_datetime("2024-01-15").unwrap(),
            ts(2024, 1, 15, 0, 0, 0)
        );
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        let err = parse_datetime("last tuesday").unwrap_err();
        assert!(matches!(err, AnalyticsError::UnparseableDate { .. }));
    }

    #[test]
    fn test_empty_spec_is_identity() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let predicate = build(sales, &FilterSpec::new()).unwrap();
        assert!(predicate.is_identity());
        assert!(predicate.matches(&Row::new()));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let spec = FilterSpec::new().with("region", "").with("category", "Books");
        let predicate = build(sales, &spec).unwrap();
        assert_eq!(predicate.conditions().len(), 1);
        assert_eq!(spec.applied().len(), 1);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let spec = FilterSpec::new().with("cuisine_type", "Thai");
        let err = build(sales, &spec).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidFilterKey { .. }));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let spec = FilterSpec::new()
            .with("start_date", "2024-01-01")
            .with("end_date", "2024-01-31 23:59:59");
        let predicate = build(sales, &spec).unwrap();

        let at = |t| Row::new().with("sale_date", t);
        assert!(predicate.matches(&at(ts(2024, 1, 1, 0, 0, 0))));
        assert!(predicate.matches(&at(ts(2024, 1, 31, 23, 59, 59))));
        assert!(!predicate.matches(&at(ts(2023, 12, 31, 23, 59, 59))));
        assert!(!predicate.matches(&at(ts(2024, 2, 1, 0, 0, 0))));
        assert!(!predicate.matches(&Row::new()));
    }

    #[test]
    fn test_bad_date_reports_unparseable() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let spec = FilterSpec::new().with("start_date", "soon");
        let err = build(sales, &spec).unwrap_err();
        assert!(matches!(err, AnalyticsError::UnparseableDate { .. }));
    }

    #[test]
    fn test_equality_matches_text_only_when_equal() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let predicate = build(sales, &FilterSpec::new().with("region", "North")).unwrap();
        assert!(predicate.matches(&Row::new().with("region", "North")));
        assert!(!predicate.matches(&Row::new().with("region", "South")));
        assert!(!predicate.matches(&Row::new()));
    }

    #[test]
    fn test_numeric_value_on_text_field() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        let predicate = build(sales, &FilterSpec::new().with("customer_id", 42.0)).unwrap();
        assert!(predicate.matches(&Row::new().with("customer_id", "42")));
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        let cond = Condition::Equals {
            field: "quantity".into(),
            value: Value::Float(2.0),
        };
        assert!(cond.matches(&Row::new().with("quantity", 2)));
    }
}
