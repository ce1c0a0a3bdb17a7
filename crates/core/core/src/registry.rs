//! Domain registry: analytics type → queryable vocabulary.
//!
//! Every analytics type has exactly one [`DomainConfig`], naming the entity
//! it targets and the fields that may be aggregated, grouped and filtered.
//! The built-in registry is constructed once per process and only read
//! afterwards.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::schema::{self, EntityDefinition, FieldType};

/// Filter keys available on every analytics type.
pub const START_DATE_KEY: &str = "start_date";
pub const END_DATE_KEY: &str = "end_date";
pub const CUSTOMER_ID_KEY: &str = "customer_id";

static BUILTIN: Lazy<DomainRegistry> = Lazy::new(DomainRegistry::builtin);

/// Returns the process-wide built-in registry.
pub fn registry() -> &'static DomainRegistry {
    &BUILTIN
}

// ==================== Analytics Types ====================

/// Supported analytics domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsType {
    /// E-commerce / sales transactions.
    Sales,
    /// Food delivery orders.
    FoodDelivery,
    /// SaaS subscriptions.
    Saas,
}

impl AnalyticsType {
    /// Every analytics type, in display order.
    pub const ALL: [AnalyticsType; 3] = [
        AnalyticsType::Sales,
        AnalyticsType::FoodDelivery,
        AnalyticsType::Saas,
    ];

    /// Returns the wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsType::Sales => "sales",
            AnalyticsType::FoodDelivery => "food_delivery",
            AnalyticsType::Saas => "saas",
        }
    }

    /// Returns a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            AnalyticsType::Sales => "E-commerce / Sales Analytics",
            AnalyticsType::FoodDelivery => "Food Delivery Analytics",
            AnalyticsType::Saas => "SaaS Subscription Analytics",
        }
    }

    fn identifiers() -> Vec<String> {
        Self::ALL.iter().map(|t| t.as_str().to_string()).collect()
    }
}

impl fmt::Display for AnalyticsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AnalyticsError::UnknownAnalyticsType {
                value: s.to_string(),
                allowed: Self::identifiers(),
            })
    }
}

// ==================== Field Roles ====================

/// The role a field plays in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Aggregatable,
    Groupable,
    Filterable,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Aggregatable => write!(f, "aggregatable"),
            FieldRole::Groupable => write!(f, "group_by"),
            FieldRole::Filterable => write!(f, "filter"),
        }
    }
}

/// How a filter key compares against its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Exact match.
    Equality,
    /// Inclusive lower bound on the date field.
    RangeStart,
    /// Inclusive upper bound on the date field.
    RangeEnd,
}

/// A filter key and the entity field it targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterField {
    pub key: String,
    pub field: String,
    pub kind: FilterKind,
}

// ==================== Domain Config ====================

/// Queryable vocabulary of one analytics type.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainConfig {
    /// The analytics type this entry describes.
    pub analytics_type: AnalyticsType,
    /// The backing storage entity.
    pub entity: EntityDefinition,
    /// Timestamp field targeted by `start_date`/`end_date`.
    pub date_field: String,
    /// Numeric fields accepted by the aggregation verbs.
    pub aggregatable_fields: Vec<String>,
    /// Categorical fields accepted as group_by.
    pub groupable_fields: Vec<String>,
    /// Filter keys, including the cross-cutting date range and customer keys.
    pub filterable_fields: Vec<FilterField>,
    /// Metric summed by the summary builder.
    pub primary_metric: String,
    /// Category broken down by the summary builder.
    pub primary_category: String,
}

impl DomainConfig {
    /// Creates a config with the cross-cutting filters already attached.
    pub fn new(
        analytics_type: AnalyticsType,
        entity: EntityDefinition,
        date_field: impl Into<String>,
    ) -> Self {
        let date_field = date_field.into();
        Self {
            analytics_type,
            entity,
            filterable_fields: vec![
                FilterField {
                    key: CUSTOMER_ID_KEY.to_string(),
                    field: CUSTOMER_ID_KEY.to_string(),
                    kind: FilterKind::Equality,
                },
                FilterField {
                    key: START_DATE_KEY.to_string(),
                    field: date_field.clone(),
                    kind: FilterKind::RangeStart,
                },
                FilterField {
                    key: END_DATE_KEY.to_string(),
                    field: date_field.clone(),
                    kind: FilterKind::RangeEnd,
                },
            ],
            date_field,
            aggregatable_fields: Vec::new(),
            groupable_fields: Vec::new(),
            primary_metric: String::new(),
            primary_category: String::new(),
        }
    }

    /// Sets the aggregatable fields.
    pub fn aggregatable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aggregatable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the groupable fields.
    pub fn groupable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groupable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Adds equality filters whose key equals the field name.
    pub fn equality_filters<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extra = fields.into_iter().map(|f| {
            let field = f.into();
            FilterField {
                key: field.clone(),
                field,
                kind: FilterKind::Equality,
            }
        });
        // Domain filters are listed before the cross-cutting ones.
        let mut filters: Vec<FilterField> = extra.collect();
        filters.append(&mut self.filterable_fields);
        self.filterable_fields = filters;
        self
    }

    /// Sets the summary's primary metric and category.
    pub fn primary(mut self, metric: impl Into<String>, category: impl Into<String>) -> Self {
        self.primary_metric = metric.into();
        self.primary_category = category.into();
        self
    }

    /// Returns the names allowed in a role.
    pub fn allowed(&self, role: FieldRole) -> Vec<String> {
        match role {
            FieldRole::Aggregatable => self.aggregatable_fields.clone(),
            FieldRole::Groupable => self.groupable_fields.clone(),
            FieldRole::Filterable => self
                .filterable_fields
                .iter()
                .map(|f| f.key.clone())
                .collect(),
        }
    }

    /// Rejects a field that is outside the role's set.
    pub fn validate_field(&self, field: &str, role: FieldRole) -> AnalyticsResult<()> {
        let known = match role {
            FieldRole::Aggregatable => self.aggregatable_fields.iter().any(|f| f == field),
            FieldRole::Groupable => self.groupable_fields.iter().any(|f| f == field),
            FieldRole::Filterable => self.filter_field(field).is_some(),
        };
        if known {
            return Ok(());
        }
        match role {
            FieldRole::Filterable => Err(AnalyticsError::InvalidFilterKey {
                analytics_type: self.analytics_type.to_string(),
                key: field.to_string(),
                allowed: self.allowed(role),
            }),
            _ => Err(AnalyticsError::InvalidField {
                analytics_type: self.analytics_type.to_string(),
                field: field.to_string(),
                role: role.to_string(),
                allowed: self.allowed(role),
            }),
        }
    }

    /// Looks up a filter key.
    pub fn filter_field(&self, key: &str) -> Option<&FilterField> {
        self.filterable_fields.iter().find(|f| f.key == key)
    }

    /// Returns the entity type of a field.
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.entity.get_field(field).map(|f| f.field_type)
    }

    /// Checks this config against its entity.
    ///
    /// Aggregatable fields must be numeric, groupable fields categorical,
    /// the date field a timestamp, and the summary fields members of their
    /// respective sets.
    pub fn validate(&self) -> AnalyticsResult<()> {
        let name = self.analytics_type;

        if self.aggregatable_fields.is_empty() {
            return Err(AnalyticsError::config(format!(
                "{name}: aggregatable fields must not be empty"
            )));
        }

        for field in &self.aggregatable_fields {
            match self.field_type(field) {
                Some(t) if t.is_numeric() => {}
                Some(t) => {
                    return Err(AnalyticsError::config(format!(
                        "{name}: aggregatable field '{field}' is {t}, not numeric"
                    )));
                }
                None => return Err(self.missing(field)),
            }
        }

        for field in &self.groupable_fields {
            match self.field_type(field) {
                Some(t) if t.is_categorical() => {}
                Some(t) => {
                    return Err(AnalyticsError::config(format!(
                        "{name}: groupable field '{field}' is {t}, not categorical"
                    )));
                }
                None => return Err(self.missing(field)),
            }
        }

        match self.field_type(&self.date_field) {
            Some(FieldType::Timestamp) => {}
            Some(t) => {
                return Err(AnalyticsError::config(format!(
                    "{name}: date field '{}' is {t}, not a timestamp",
                    self.date_field
                )));
            }
            None => return Err(self.missing(&self.date_field)),
        }

        for filter in &self.filterable_fields {
            if self.field_type(&filter.field).is_none() {
                return Err(self.missing(&filter.field));
            }
        }

        if !self.aggregatable_fields.contains(&self.primary_metric) {
            return Err(AnalyticsError::config(format!(
                "{name}: primary metric '{}' is not aggregatable",
                self.primary_metric
            )));
        }
        if !self.groupable_fields.contains(&self.primary_category) {
            return Err(AnalyticsError::config(format!(
                "{name}: primary category '{}' is not groupable",
                self.primary_category
            )));
        }

        Ok(())
    }

    fn missing(&self, field: &str) -> AnalyticsError {
        AnalyticsError::config(format!(
            "{}: field '{}' does not exist on entity '{}'",
            self.analytics_type, field, self.entity.name
        ))
    }

    /// Returns the field sets for client-side discovery.
    pub fn catalog(&self) -> FieldCatalog {
        FieldCatalog {
            analytics_type: self.analytics_type,
            entity: self.entity.name.clone(),
            date_field: self.date_field.clone(),
            aggregatable_fields: self.aggregatable_fields.clone(),
            groupable_fields: self.groupable_fields.clone(),
            filterable_fields: self.allowed(FieldRole::Filterable),
            primary_metric: self.primary_metric.clone(),
            primary_category: self.primary_category.clone(),
        }
    }
}

/// Field sets of one analytics type, as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCatalog {
    pub analytics_type: AnalyticsType,
    pub entity: String,
    pub date_field: String,
    pub aggregatable_fields: Vec<String>,
    pub groupable_fields: Vec<String>,
    pub filterable_fields: Vec<String>,
    pub primary_metric: String,
    pub primary_category: String,
}

// ==================== Registry ====================

/// The set of domain configs, one per analytics type.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    configs: Vec<DomainConfig>,
}

impl DomainRegistry {
    /// Creates a registry from explicit configs.
    ///
    /// Every config is validated against its entity and each analytics type
    /// may appear only once.
    pub fn new(configs: Vec<DomainConfig>) -> AnalyticsResult<Self> {
        for (i, config) in configs.iter().enumerate() {
            config.validate()?;
            if configs[..i]
                .iter()
                .any(|c| c.analytics_type == config.analytics_type)
            {
                return Err(AnalyticsError::config(format!(
                    "duplicate registry entry for {}",
                    config.analytics_type
                )));
            }
        }
        Ok(Self { configs })
    }

    /// Returns the built-in registry for sales, food delivery and SaaS.
    pub fn builtin() -> Self {
        Self {
            configs: vec![sales_config(), food_delivery_config(), saas_config()],
        }
    }

    /// Resolves the config of an analytics type.
    pub fn resolve(&self, analytics_type: AnalyticsType) -> AnalyticsResult<&DomainConfig> {
        self.configs
            .iter()
            .find(|c| c.analytics_type == analytics_type)
            .ok_or_else(|| AnalyticsError::UnknownAnalyticsType {
                value: analytics_type.to_string(),
                allowed: self.identifiers(),
            })
    }

    /// Parses an identifier and resolves its config.
    pub fn resolve_str(&self, analytics_type: &str) -> AnalyticsResult<&DomainConfig> {
        let parsed = analytics_type.parse::<AnalyticsType>()?;
        self.resolve(parsed)
    }

    /// Returns the registered analytics types.
    pub fn types(&self) -> impl Iterator<Item = AnalyticsType> + '_ {
        self.configs.iter().map(|c| c.analytics_type)
    }

    /// Returns every config.
    pub fn configs(&self) -> &[DomainConfig] {
        &self.configs
    }

    fn identifiers(&self) -> Vec<String> {
        self.types().map(|t| t.to_string()).collect()
    }
}

fn sales_config() -> DomainConfig {
    let categories = ["category", "region", "product_name", "payment_method"];
    DomainConfig::new(AnalyticsType::Sales, schema::sales_entity(), "sale_date")
        .aggregatable(["amount", "quantity"])
        .groupable(categories)
        .equality_filters(categories)
        .primary("amount", "category")
}

fn food_delivery_config() -> DomainConfig {
    let categories = ["restaurant_name", "cuisine_type", "city", "delivery_status"];
    DomainConfig::new(
        AnalyticsType::FoodDelivery,
        schema::food_order_entity(),
        "order_date",
    )
    .aggregatable([
        "order_amount",
        "delivery_fee",
        "tip_amount",
        "total_amount",
        "delivery_time_minutes",
    ])
    .groupable(categories)
    .equality_filters(categories)
    .primary("total_amount", "cuisine_type")
}

fn saas_config() -> DomainConfig {
    let categories = ["plan_name", "plan_type", "status", "currency"];
    DomainConfig::new(
        AnalyticsType::Saas,
        schema::subscription_entity(),
        "billing_cycle_start",
    )
    .aggregatable(["amount", "mrr"])
    .groupable(categories)
    .equality_filters(categories)
    .primary("amount", "plan_name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};

    #[test]
    fn test_builtin_configs_are_valid() {
        let registry = DomainRegistry::builtin();
        for config in registry.configs() {
            config.validate().unwrap();
        }
        assert!(DomainRegistry::new(registry.configs().to_vec()).is_ok());
    }

    #[test]
    fn test_every_type_has_one_entry() {
        for t in AnalyticsType::ALL {
            assert_eq!(registry().resolve(t).unwrap().analytics_type, t);
        }
        assert_eq!(registry().types().count(), AnalyticsType::ALL.len());
    }

    #[test]
    fn test_parse_analytics_type() {
        assert_eq!(
            "food_delivery".parse::<AnalyticsType>().unwrap(),
            AnalyticsType::FoodDelivery
        );
        let err = "crm".parse::<AnalyticsType>().unwrap_err();
        assert!(matches!(err, AnalyticsError::UnknownAnalyticsType { .. }));
        assert!(err.to_string().contains("sales, food_delivery, saas"));
    }

    #[test]
    fn test_validate_field_roles() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap();
        assert!(sales.validate_field("amount", FieldRole::Aggregatable).is_ok());
        assert!(sales.validate_field("category", FieldRole::Groupable).is_ok());
        assert!(sales.validate_field("customer_id", FieldRole::Filterable).is_ok());
        assert!(sales.validate_field("start_date", FieldRole::Filterable).is_ok());

        let err = sales
            .validate_field("category", FieldRole::Aggregatable)
            .unwrap_err();
        match err {
            AnalyticsError::InvalidField { field, allowed, .. } => {
                assert_eq!(field, "category");
                assert_eq!(allowed, vec!["amount", "quantity"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = sales.validate_field("mrr", FieldRole::Filterable).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidFilterKey { .. }));
    }

    #[test]
    fn test_cross_cutting_filters_present_everywhere() {
        for config in registry().configs() {
            for key in [CUSTOMER_ID_KEY, START_DATE_KEY, END_DATE_KEY] {
                assert!(config.filter_field(key).is_some(), "{key} missing");
            }
            assert_eq!(
                config.filter_field(START_DATE_KEY).unwrap().field,
                config.date_field
            );
        }
    }

    #[test]
    fn test_rejects_non_numeric_aggregatable() {
        let entity = EntityDefinition::new("t")
            .field(Field::new("label", FieldType::Text))
            .field(Field::new("customer_id", FieldType::Text))
            .field(Field::new("at", FieldType::Timestamp));
        let config = DomainConfig::new(AnalyticsType::Sales, entity, "at")
            .aggregatable(["label"])
            .groupable(["label"])
            .primary("label", "label");
        let err = DomainRegistry::new(vec![config]).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigurationError { .. }));
    }

    #[test]
    fn test_rejects_duplicate_entries() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap().clone();
        let err = DomainRegistry::new(vec![sales.clone(), sales]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_registry_without_entry_reports_unknown_type() {
        let sales = registry().resolve(AnalyticsType::Sales).unwrap().clone();
        let registry = DomainRegistry::new(vec![sales]).unwrap();
        let err = registry.resolve(AnalyticsType::Saas).unwrap_err();
        assert!(matches!(err, AnalyticsError::UnknownAnalyticsType { .. }));
    }
}
