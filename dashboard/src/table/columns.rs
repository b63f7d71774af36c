//! Column inference from the first record of a batch.
//!
//! Only the first record's shape is consulted: its top-level keys (minus
//! `properties` and `children`) in encountered order, then the keys of its
//! `properties` object. Later records with other keys contribute no columns.

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::classify::{classify, render_cell, Cell, SemanticCategory};

/// Field holding an integration's nested per-record properties.
pub const PROPERTIES_FIELD: &str = "properties";

/// Field holding nested child records, never tabulated.
pub const CHILDREN_FIELD: &str = "children";

/// Where a column reads its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// `record[key]`
    TopLevel(String),
    /// `record.properties[key]`
    Property(String),
}

impl FieldPath {
    /// The key the column is named after.
    pub fn field(&self) -> &str {
        match self {
            FieldPath::TopLevel(key) | FieldPath::Property(key) => key,
        }
    }

    pub fn segments(&self) -> Vec<&str> {
        match self {
            FieldPath::TopLevel(key) => vec![key.as_str()],
            FieldPath::Property(key) => vec![PROPERTIES_FIELD, key.as_str()],
        }
    }

    /// Value at this path, `None` when absent.
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        match self {
            FieldPath::TopLevel(key) => record.get(key),
            FieldPath::Property(key) => record.get(PROPERTIES_FIELD).and_then(|p| p.get(key)),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.segments().serialize(serializer)
    }
}

/// One inferred column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Display label.
    pub title: String,
    /// Unique column key: the field name, or `properties_<name>` for nested fields.
    pub key: String,
    pub path: FieldPath,
}

impl ColumnSpec {
    fn top_level(field: &str) -> Self {
        Self {
            title: column_title(field),
            key: field.to_string(),
            path: FieldPath::TopLevel(field.to_string()),
        }
    }

    fn property(field: &str) -> Self {
        Self {
            title: column_title(field),
            key: format!("{}_{}", PROPERTIES_FIELD, field),
            path: FieldPath::Property(field.to_string()),
        }
    }

    /// Classify a raw value of this column.
    pub fn classify(&self, value: Option<&Value>) -> SemanticCategory {
        classify(self.path.field(), value)
    }

    /// Render this column's cell for `record`.
    pub fn render(&self, record: &Value) -> Cell {
        render_cell(self.path.field(), self.path.lookup(record))
    }
}

/// Infer the column list of a batch from its first record.
///
/// An empty batch, or a first record that is not an object, yields no columns.
pub fn infer_columns(records: &[Value]) -> Vec<ColumnSpec> {
    let Some(Value::Object(first)) = records.first() else {
        return Vec::new();
    };

    let mut columns: Vec<ColumnSpec> = first
        .keys()
        .filter(|key| key.as_str() != PROPERTIES_FIELD && key.as_str() != CHILDREN_FIELD)
        .map(|key| ColumnSpec::top_level(key))
        .collect();

    if let Some(Value::Object(properties)) = first.get(PROPERTIES_FIELD) {
        columns.extend(properties.keys().map(|key| ColumnSpec::property(key)));
    }

    columns
}

/// `created_time` → `Created Time`.
pub fn column_title(key: &str) -> String {
    key.split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
