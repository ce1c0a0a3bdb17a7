//! # Polystat Import
//!
//! Bulk loading of CSV and JSON payloads into a storage adapter.
//!
//! Records are read generically from the entity schema of the target
//! analytics type: each declared field is looked up by name, trimmed and
//! coerced to its type. Missing fields take the schema default, optional
//! fields become null, and a missing required field rejects the payload.
//! The whole payload is parsed before anything is written.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polystat_import::{ImportFormat, Importer};
//!
//! let importer = Importer::new(adapter.clone());
//! let report = importer
//!     .import(AnalyticsType::Sales, ImportFormat::Csv, csv_bytes)
//!     .await?;
//! ```

mod error;

pub use error::ImportError;

use chrono::{NaiveDateTime, Utc};
use polystat_core::registry::{AnalyticsType, registry};
use polystat_core::schema::{EntityDefinition, Field, FieldDefault, FieldType};
use polystat_core::traits::StorageAdapter;
use polystat_core::types::{Row, Value};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    /// Comma-separated with a header row.
    Csv,
    /// An array of objects.
    Json,
}

impl ImportFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for ImportFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" => Ok(ImportFormat::Json),
            _ => Err(ImportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormat::Csv => write!(f, "csv"),
            ImportFormat::Json => write!(f, "json"),
        }
    }
}

/// Outcome of one import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub analytics_type: AnalyticsType,
    pub records_imported: usize,
    pub skipped_duplicates: usize,
}

impl ImportReport {
    /// Human-readable summary line.
    pub fn message(&self) -> String {
        let noun = match self.analytics_type {
            AnalyticsType::Sales => "sales transactions",
            AnalyticsType::FoodDelivery => "food orders",
            AnalyticsType::Saas => "subscriptions",
        };
        format!("Successfully imported {} {}", self.records_imported, noun)
    }
}

/// Imports payloads into a storage adapter.
#[derive(Clone)]
pub struct Importer {
    storage: Arc<dyn StorageAdapter>,
}

impl Importer {
    /// Creates an importer writing to `storage`.
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Parses `payload` and inserts every record.
    pub async fn import(
        &self,
        analytics_type: AnalyticsType,
        format: ImportFormat,
        payload: &[u8],
    ) -> Result<ImportReport, ImportError> {
        let config = registry().resolve(analytics_type)?;
        let rows = parse_records(&config.entity, format, payload)?;
        let parsed = rows.len();

        let outcome = self.storage.insert_rows(&config.entity, rows).await?;
        info!(
            %analytics_type,
            %format,
            parsed,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "import finished"
        );

        Ok(ImportReport {
            analytics_type,
            records_imported: outcome.inserted,
            skipped_duplicates: outcome.skipped,
        })
    }

    /// Reads a file and imports it, choosing the format from its extension.
    pub async fn import_file(
        &self,
        analytics_type: AnalyticsType,
        path: impl AsRef<Path>,
    ) -> Result<ImportReport, ImportError> {
        let path = path.as_ref();
        let format = ImportFormat::from_path(path)?;
        let payload = tokio::fs::read(path).await?;
        self.import(analytics_type, format, &payload).await
    }
}

/// Parses a payload into rows of `entity`.
pub fn parse_records(
    entity: &EntityDefinition,
    format: ImportFormat,
    payload: &[u8],
) -> Result<Vec<Row>, ImportError> {
    let now = Utc::now().naive_utc();
    match format {
        ImportFormat::Csv => parse_csv(entity, payload, now),
        ImportFormat::Json => parse_json(entity, payload, now),
    }
}

fn parse_csv(
    entity: &EntityDefinition,
    payload: &[u8],
    now: NaiveDateTime,
) -> Result<Vec<Row>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(payload);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = build_row(entity, index + 1, now, |name| {
            headers
                .iter()
                .position(|h| h == name)
                .and_then(|i| record.get(i))
                .map(str::to_string)
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_json(
    entity: &EntityDefinition,
    payload: &[u8],
    now: NaiveDateTime,
) -> Result<Vec<Row>, ImportError> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_slice(payload)?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            build_row(entity, index + 1, now, |name| {
                record.get(name).and_then(json_text)
            })
        })
        .collect()
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn build_row(
    entity: &EntityDefinition,
    record: usize,
    now: NaiveDateTime,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Row, ImportError> {
    let mut row = Row::new();
    for field in &entity.fields {
        let raw = lookup(&field.name).filter(|s| !s.trim().is_empty());
        let value = match raw {
            Some(raw) => coerce(field.field_type, &raw),
            None => default_value(field, now),
        }
        .map_err(|reason| ImportError::InvalidRecord {
            record,
            field: field.name.clone(),
            reason,
        })?;
        row.set(field.name.clone(), value);
    }
    Ok(row)
}

fn coerce(field_type: FieldType, raw: &str) -> Result<Value, String> {
    match field_type.parse(raw) {
        // "3.0" is a valid integer in exported spreadsheets.
        Err(reason) if field_type == FieldType::Integer => {
            let Some(f) = raw.trim().parse::<f64>().ok().filter(|f| f.fract() == 0.0) else {
                return Err(reason);
            };
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            if f < i64::MIN as f64 || f >= i64::MAX as f64 {
                return Err(format!("integer out of range, got '{}'", raw.trim()));
            }
            Ok(Value::Integer(f as i64))
        }
        other => other,
    }
}

fn default_value(field: &Field, now: NaiveDateTime) -> Result<Value, String> {
    match &field.default {
        Some(FieldDefault::Literal(literal)) => field.field_type.parse(literal),
        Some(FieldDefault::GeneratedId { prefix, uppercase }) => {
            Ok(Value::Text(generate_id(prefix, *uppercase)))
        }
        Some(FieldDefault::Now) => Ok(Value::Timestamp(now)),
        None if field.required => Err("is required".to_string()),
        None => Ok(Value::Null),
    }
}

fn generate_id(prefix: &str, uppercase: bool) -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(8);
    if uppercase {
        hex.make_ascii_uppercase();
    }
    format!("{prefix}{hex}")
}
