//! Entity schemas for Polystat.
//!
//! This module describes the storage entities backing each analytics type
//! in a backend-agnostic way. The registry validates its field sets against
//! these definitions, adapters validate inserted rows, and the importer
//! coerces raw records with them.

use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::filter::parse_datetime;
use crate::types::{Row, Value};

/// Represents a complete entity (table) definition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntityDefinition {
    /// The name of the entity/table.
    pub name: String,
    /// The fields (columns) in this entity.
    pub fields: Vec<Field>,
}

impl EntityDefinition {
    /// Creates a new entity definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the entity.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Gets a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the fields whose values must be unique across rows.
    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// Checks that a row fits this entity.
    ///
    /// Every populated field must be declared and carry a value of the
    /// declared type; required fields must be present and non-null.
    pub fn validate_row(&self, row: &Row) -> AnalyticsResult<()> {
        for (name, value) in row.iter() {
            let field = self.get_field(name).ok_or_else(|| {
                AnalyticsError::storage(format!(
                    "entity '{}' has no field '{}'",
                    self.name, name
                ))
            })?;
            if !value.is_null() && !field.field_type.accepts(value) {
                return Err(AnalyticsError::storage(format!(
                    "field '{}.{}' expects {} but got {}",
                    self.name,
                    name,
                    field.field_type,
                    value.kind()
                )));
            }
        }

        for field in self.fields.iter().filter(|f| f.required) {
            if row.get(&field.name).is_null() {
                return Err(AnalyticsError::storage(format!(
                    "field '{}.{}' is required",
                    self.name, field.name
                )));
            }
        }

        Ok(())
    }
}

/// Represents a field (column) in an entity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
    /// The name of the field.
    pub name: String,
    /// The data type of the field.
    pub field_type: FieldType,
    /// Whether this field is required (NOT NULL).
    pub required: bool,
    /// Whether this field is unique.
    pub unique: bool,
    /// Value used by the importer when a record omits this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
}

impl Field {
    /// Creates a new required field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            unique: false,
            default: None,
        }
    }

    /// Creates a new optional (nullable) field.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::new(name, field_type)
        }
    }

    /// Makes this field unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets a literal default value.
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(FieldDefault::Literal(value.into()));
        self
    }

    /// Defaults to a generated identifier with the given prefix and
    /// lowercase hex digits.
    pub fn generated(mut self, prefix: impl Into<String>) -> Self {
        self.default = Some(FieldDefault::GeneratedId {
            prefix: prefix.into(),
            uppercase: false,
        });
        self
    }

    /// Like [`generated`](Field::generated), with uppercase hex digits.
    pub fn generated_upper(mut self, prefix: impl Into<String>) -> Self {
        self.default = Some(FieldDefault::GeneratedId {
            prefix: prefix.into(),
            uppercase: true,
        });
        self
    }

    /// Defaults to the current time.
    pub fn default_now(mut self) -> Self {
        self.default = Some(FieldDefault::Now);
        self
    }
}

/// How a missing field is filled in on import.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    /// A literal, parsed with the field's type.
    Literal(String),
    /// `<prefix><8 hex chars>`.
    GeneratedId { prefix: String, uppercase: bool },
    /// The import time.
    Now,
}

/// Supported field types.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Text; the only categorical type.
    Text,
    /// 64-bit integer.
    Integer,
    /// Double precision float.
    Float,
    /// Timestamp without timezone.
    Timestamp,
}

impl FieldType {
    /// Numeric types can be aggregated.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Categorical types can partition a grouped aggregation.
    pub fn is_categorical(&self) -> bool {
        matches!(self, FieldType::Text)
    }

    /// Returns true if a non-null value belongs to this type.
    ///
    /// Floats must be finite.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Float, Value::Float(f)) => f.is_finite(),
            (FieldType::Text, Value::Text(_))
            | (FieldType::Integer | FieldType::Float, Value::Integer(_))
            | (FieldType::Timestamp, Value::Timestamp(_)) => true,
            _ => false,
        }
    }

    /// Parses raw text into a value of this type.
    ///
    /// The input is trimmed; an empty string reads as null.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            FieldType::Text => Ok(Value::Text(raw.to_string())),
            FieldType::Integer => raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("expected an integer, got '{raw}'")),
            FieldType::Float => match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                Ok(_) => Err(format!("expected a finite number, got '{raw}'")),
                Err(_) => Err(format!("expected a number, got '{raw}'")),
            },
            FieldType::Timestamp => parse_datetime(raw)
                .map(Value::Timestamp)
                .map_err(|e| e.to_string()),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// E-commerce sales transactions.
pub fn sales_entity() -> EntityDefinition {
    EntityDefinition::new("sales_transactions")
        .field(Field::optional("id", FieldType::Integer).unique())
        .field(Field::new("product_name", FieldType::Text))
        .field(Field::new("category", FieldType::Text))
        .field(Field::new("amount", FieldType::Float))
        .field(Field::new("quantity", FieldType::Integer).default("1"))
        .field(Field::new("region", FieldType::Text))
        .field(Field::new("customer_id", FieldType::Text).generated("CUST_"))
        .field(Field::new("payment_method", FieldType::Text).default("credit_card"))
        .field(Field::new("sale_date", FieldType::Timestamp).default_now())
}

/// Food delivery orders.
pub fn food_order_entity() -> EntityDefinition {
    EntityDefinition::new("food_orders")
        .field(
            Field::new("order_id", FieldType::Text)
                .unique()
                .generated_upper("ORD_"),
        )
        .field(Field::new("restaurant_name", FieldType::Text))
        .field(Field::new("cuisine_type", FieldType::Text))
        .field(Field::new("order_amount", FieldType::Float).default("0"))
        .field(Field::new("delivery_fee", FieldType::Float).default("0"))
        .field(Field::new("tip_amount", FieldType::Float).default("0"))
        .field(Field::new("total_amount", FieldType::Float).default("0"))
        .field(Field::new("customer_id", FieldType::Text).generated("CUST_"))
        .field(Field::new("city", FieldType::Text))
        .field(Field::new("delivery_status", FieldType::Text).default("pending"))
        .field(Field::new("order_date", FieldType::Timestamp).default_now())
        .field(Field::optional("delivery_time_minutes", FieldType::Integer))
}

/// SaaS subscriptions.
pub fn subscription_entity() -> EntityDefinition {
    EntityDefinition::new("subscriptions")
        .field(
            Field::new("subscription_id", FieldType::Text)
                .unique()
                .generated_upper("SUB_"),
        )
        .field(Field::new("customer_id", FieldType::Text).generated("CUST_"))
        .field(Field::new("plan_name", FieldType::Text))
        .field(Field::new("plan_type", FieldType::Text).default("monthly"))
        .field(Field::new("amount", FieldType::Float).default("0"))
        .field(Field::new("status", FieldType::Text).default("active"))
        .field(Field::new("currency", FieldType::Text).default("USD"))
        .field(Field::new("billing_cycle_start", FieldType::Timestamp).default_now())
        .field(Field::new("billing_cycle_end", FieldType::Timestamp).default_now())
        .field(Field::optional("cancelled_at", FieldType::Timestamp))
        .field(Field::new("mrr", FieldType::Float).default("0"))
}
