use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

/// Largest integer magnitude an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single persisted listing attribute.
///
/// Serializes untagged so the stored `attributes` map is flat JSON:
/// `{"minPlayers": 2, "storage": "1 TB", "stickDrift": false}`.
/// Whole numbers are written as JSON integers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// JSON boolean.
    Bool(bool),
    /// JSON number. Always finite once it reaches the serializer.
    Number(f64),
    /// JSON string.
    Text(String),
    /// JSON array of strings (multiselect values).
    List(Vec<String>),
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
                    // Exact by the guard above.
                    #[allow(clippy::cast_possible_truncation)]
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
        }
    }
}

impl AttributeValue {
    /// Converts a raw stored JSON value into an attribute.
    ///
    /// Arrays keep their scalar members as strings. `null`, objects and
    /// non-finite numbers yield `None` and are dropped by callers.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Array(items) => Some(Self::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        serde_json::Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }

    /// Returns the string payload of a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as a finite number.
    ///
    /// Text is accepted when it parses after trimming, with `,` treated as
    /// the decimal separator.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
            Self::Bool(_) | Self::List(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Display form used for option membership and text coercion.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }

    /// Whether the value carries no user content (blank text or empty list).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

/// Flat attribute bag persisted on a listing. An absent key means "not provided".
///
/// Uses `BTreeMap` for deterministic serialization order.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// In-memory state of one form input.
///
/// Keeps "never touched", "cleared" and "has a value" apart instead of
/// overloading absent/empty-string/null. Both `Unset` and `Empty` are omitted
/// on save.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum FieldInput {
    /// The user has not touched the input.
    #[default]
    Unset,
    /// The user cleared the input.
    Empty,
    /// The input holds a value.
    Value(AttributeValue),
}

impl FieldInput {
    /// Returns the held value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&AttributeValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unset | Self::Empty => None,
        }
    }

    /// Shorthand for `FieldInput::Value(AttributeValue::Text(..))`.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Value(AttributeValue::Text(s.into()))
    }

    /// Shorthand for `FieldInput::Value(AttributeValue::Number(..))`.
    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::Value(AttributeValue::Number(n))
    }

    /// Shorthand for `FieldInput::Value(AttributeValue::Bool(..))`.
    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::Value(AttributeValue::Bool(b))
    }
}
