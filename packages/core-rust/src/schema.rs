//! Per-category listing schema documents.
//!
//! A schema is stored data, independent of application code: one document
//! per category listing the extra form fields a listing in that category
//! carries. Documents are parsed leniently. A malformed field entry is
//! dropped on its own instead of invalidating the whole schema.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Input type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    #[default]
    Text,
    /// Numeric input with optional inclusive bounds.
    Number,
    /// One value out of the declared options.
    Select,
    /// Any subset of the declared options.
    #[serde(rename = "multiselect")]
    MultiSelect,
    /// Yes/no.
    Boolean,
}

impl FieldType {
    /// Parses a stored type name. Unknown names degrade to [`FieldType::Text`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "number" | "numeric" | "integer" => Self::Number,
            "select" | "enum" => Self::Select,
            "multiselect" | "multi-select" | "multi_select" => Self::MultiSelect,
            "boolean" | "bool" => Self::Boolean,
            _ => Self::Text,
        }
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A select/multiselect option: either a bare string or a `{value, label}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    /// Value and label are the same string.
    Plain(String),
    /// Stored value with a separate display label.
    Labeled {
        /// Value persisted in the attribute map.
        value: String,
        /// Human-readable label. Empty falls back to `value`.
        #[serde(default)]
        label: String,
    },
}

impl FieldOption {
    /// Value persisted when this option is chosen.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(v) | Self::Labeled { value: v, .. } => v,
        }
    }

    /// Label shown to the user.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Labeled { value, label } if label.is_empty() => value,
            Self::Labeled { label, .. } => label,
        }
    }
}

/// Definition of one dynamic form field and its validation contract.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// Attribute key the value is stored under.
    pub key: String,
    /// Human-readable label. Empty falls back to `key`.
    #[serde(default)]
    pub label: String,
    /// Input type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether an empty value blocks submission.
    #[serde(default)]
    pub required: bool,
    /// Inclusive lower bound for number fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound for number fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values for select/multiselect fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    /// Maximum length in characters for text fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl SchemaField {
    /// Label for messages and controls.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.key
        } else {
            &self.label
        }
    }

    /// Declared options, empty when none were declared.
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Whether `value` is acceptable for this field's option list.
    ///
    /// A field without declared options accepts any value.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        let options = self.options();
        options.is_empty() || options.iter().any(|o| o.value() == value)
    }
}

/// Errors decoding a stored schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema document is not a JSON object")]
    NotAnObject,
    #[error("schema document has a non-array `fields` member")]
    FieldsNotAnArray,
    #[error("invalid schema document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The stored per-category schema document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSchemaDoc {
    /// Category this schema belongs to (also the document id).
    #[serde(default)]
    pub category_id: String,
    /// Schema revision, copied onto listings as `schemaVersion`.
    #[serde(default)]
    pub version: u32,
    /// Field definitions in render order.
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl ListingSchemaDoc {
    /// Decodes a raw stored document.
    ///
    /// Field entries that fail to decode or have an empty key are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not an object, `fields` is not an
    /// array, or `version` has the wrong type.
    pub fn from_document(doc: &serde_json::Value) -> Result<Self, SchemaError> {
        let obj = doc.as_object().ok_or(SchemaError::NotAnObject)?;

        let category_id = obj
            .get("categoryId")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = match obj.get("version") {
            None | Some(serde_json::Value::Null) => 0,
            Some(v) => serde_json::from_value(v.clone())?,
        };

        let raw_fields = match obj.get("fields") {
            None | Some(serde_json::Value::Null) => &[][..],
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            Some(_) => return Err(SchemaError::FieldsNotAnArray),
        };

        let fields = raw_fields
            .iter()
            .filter_map(|raw| match serde_json::from_value::<SchemaField>(raw.clone()) {
                Ok(field) if !field.key.trim().is_empty() => Some(field),
                Ok(_) => {
                    debug!(category_id = %category_id, "Dropping schema field without key");
                    None
                }
                Err(e) => {
                    debug!(category_id = %category_id, error = %e, "Dropping undecodable schema field");
                    None
                }
            })
            .collect();

        Ok(Self {
            category_id,
            version,
            fields,
        })
    }
}

/// Outcome of loading a category's schema. Absence is a normal state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LoadedSchema {
    /// Whether a schema document was found and decoded.
    pub exists: bool,
    /// Schema version; 0 when absent.
    pub version: u32,
    /// Field definitions; empty when absent.
    pub fields: Vec<SchemaField>,
}

impl LoadedSchema {
    /// The "no schema" state: no dynamic fields are rendered.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Version to stamp on a saved listing, `None` without a schema.
    #[must_use]
    pub fn listing_version(&self) -> Option<u32> {
        self.exists.then_some(self.version)
    }
}

impl From<ListingSchemaDoc> for LoadedSchema {
    fn from(doc: ListingSchemaDoc) -> Self {
        Self {
            exists: true,
            version: doc.version,
            fields: doc.fields,
        }
    }
}
