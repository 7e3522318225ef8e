//! Dynamic form rendering and input normalization.
//!
//! [`render_form`] turns schema fields plus the override plan into an
//! ordered list of [`FormControl`]s bound to [`FormValues`]. Raw input is
//! normalized per control kind before it reaches the value map, so number
//! inputs never hold non-numeric characters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::overrides::{OverrideField, OverrideKind, OverridePlan};
use crate::schema::{FieldOption, FieldType, SchemaField};
use crate::types::{AttributeMap, AttributeValue, FieldInput};

/// Input control kind with its constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlKind {
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Select {
        options: Vec<FieldOption>,
    },
    #[serde(rename = "multiselect")]
    MultiSelect {
        options: Vec<FieldOption>,
    },
    Boolean,
}

/// Where a control comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlOrigin {
    /// Generic field from the category schema.
    Schema,
    /// Hard-coded category override field.
    Override,
}

/// One rendered input control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormControl {
    pub key: String,
    pub label: String,
    pub required: bool,
    pub kind: ControlKind,
    pub origin: ControlOrigin,
    pub value: FieldInput,
}

impl ControlKind {
    /// Control for a schema field.
    #[must_use]
    pub fn for_schema_field(field: &SchemaField) -> Self {
        match field.field_type {
            FieldType::Text => Self::Text {
                max_length: field.max_length,
            },
            FieldType::Number => Self::Number {
                min: field.min,
                max: field.max,
            },
            FieldType::Select => Self::Select {
                options: field.options().to_vec(),
            },
            FieldType::MultiSelect => Self::MultiSelect {
                options: field.options().to_vec(),
            },
            FieldType::Boolean => Self::Boolean,
        }
    }

    /// Control for an override field; model selects use the plan's options.
    #[must_use]
    pub fn for_override(field: &OverrideField, plan: &OverridePlan) -> Self {
        match field.kind {
            OverrideKind::Text { max_length } => Self::Text { max_length },
            // Bounds are small integers; exact in f64.
            #[allow(clippy::cast_precision_loss)]
            OverrideKind::Integer { min, max } => Self::Number {
                min: Some(min as f64),
                max: Some(max as f64),
            },
            OverrideKind::Select(options) => Self::Select {
                options: plain_options(options),
            },
            OverrideKind::Model => Self::Select {
                options: plain_options(plan.model_options()),
            },
            OverrideKind::Boolean => Self::Boolean,
        }
    }

    fn options(&self) -> &[FieldOption] {
        match self {
            Self::Select { options } | Self::MultiSelect { options } => options,
            _ => &[],
        }
    }

    fn offers(&self, value: &str) -> bool {
        let options = self.options();
        options.is_empty() || options.iter().any(|o| o.value() == value)
    }

    /// Normalizes raw user input into a form value.
    ///
    /// - text: truncated to `max_length` characters
    /// - number: non-numeric characters stripped
    /// - select: values outside the options become `Empty`
    /// - multiselect: always a list, unknown values dropped
    /// - boolean: `true`/`evet`/`1` and `false`/`hayır`/`0`, anything else `Empty`
    #[must_use]
    pub fn normalize_input(&self, raw: AttributeValue) -> FieldInput {
        match self {
            Self::Text { max_length } => {
                let mut text = raw.to_display_string();
                if let Some(limit) = max_length {
                    if let Some((idx, _)) = text.char_indices().nth(*limit) {
                        text.truncate(idx);
                    }
                }
                if text.is_empty() {
                    FieldInput::Empty
                } else {
                    FieldInput::text(text)
                }
            }
            Self::Number { min, .. } => match raw {
                AttributeValue::Number(n) if n.is_finite() => FieldInput::number(n),
                other => {
                    let allow_negative = min.map_or(true, |m| m < 0.0);
                    let cleaned = sanitize_number(&other.to_display_string(), allow_negative);
                    if cleaned.is_empty() || cleaned == "-" {
                        FieldInput::Empty
                    } else {
                        FieldInput::text(cleaned)
                    }
                }
            },
            Self::Select { .. } => {
                let value = raw.to_display_string();
                if value.is_empty() || !self.offers(&value) {
                    FieldInput::Empty
                } else {
                    FieldInput::text(value)
                }
            }
            Self::MultiSelect { .. } => {
                let items = match raw {
                    AttributeValue::List(items) => items,
                    AttributeValue::Text(s) if s.trim().is_empty() => Vec::new(),
                    other => vec![other.to_display_string()],
                };
                let mut selected: Vec<String> = Vec::with_capacity(items.len());
                for item in items {
                    if self.offers(&item) && !selected.contains(&item) {
                        selected.push(item);
                    }
                }
                FieldInput::Value(AttributeValue::List(selected))
            }
            Self::Boolean => match raw {
                AttributeValue::Bool(b) => FieldInput::boolean(b),
                other => match other.to_display_string().trim().to_lowercase().as_str() {
                    "true" | "evet" | "1" => FieldInput::boolean(true),
                    "false" | "hayır" | "hayir" | "0" => FieldInput::boolean(false),
                    _ => FieldInput::Empty,
                },
            },
        }
    }
}

fn plain_options(values: &[&str]) -> Vec<FieldOption> {
    values.iter().map(|v| FieldOption::Plain((*v).to_string())).collect()
}

/// Strips everything but digits, one decimal separator (`,` becomes `.`)
/// and, when allowed, a leading minus sign.
#[must_use]
pub fn sanitize_number(raw: &str, allow_negative: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut seen_separator = false;
    for c in raw.trim().chars() {
        match c {
            '0'..='9' => out.push(c),
            '.' | ',' if !seen_separator => {
                seen_separator = true;
                out.push('.');
            }
            '-' if allow_negative && out.is_empty() => out.push('-'),
            _ => {}
        }
    }
    out
}

static UNSET: FieldInput = FieldInput::Unset;

/// Form values keyed by field key. Keys that were never touched are `Unset`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormValues {
    inputs: BTreeMap<String, FieldInput>,
}

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds form values from a stored attribute map.
    #[must_use]
    pub fn from_attributes(attributes: &AttributeMap) -> Self {
        Self {
            inputs: attributes
                .iter()
                .map(|(k, v)| (k.clone(), FieldInput::Value(v.clone())))
                .collect(),
        }
    }

    /// Current input for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> &FieldInput {
        self.inputs.get(key).unwrap_or(&UNSET)
    }

    /// Current value for `key`, if set.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&AttributeValue> {
        self.get(key).value()
    }

    /// Text payload of `key`, if it holds text.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(AttributeValue::as_text)
    }

    /// Stores an already-normalized input. Storing `Unset` forgets the key.
    pub fn set(&mut self, key: impl Into<String>, input: FieldInput) {
        let key = key.into();
        if input == FieldInput::Unset {
            self.inputs.remove(&key);
        } else {
            self.inputs.insert(key, input);
        }
    }

    /// Normalizes `raw` for `kind` and stores it.
    pub fn edit(&mut self, key: impl Into<String>, kind: &ControlKind, raw: AttributeValue) {
        let input = kind.normalize_input(raw);
        self.set(key, input);
    }

    /// Forgets any value entered for `key`. Returns whether one was present.
    pub fn clear(&mut self, key: &str) -> bool {
        self.inputs.remove(key).is_some()
    }

    /// Keys with a stored input (set or cleared).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Renders one control per visible field.
///
/// Schema fields come first in schema order, minus override-owned keys;
/// visible override fields follow in their declared order.
#[must_use]
pub fn render_form(
    schema_fields: &[SchemaField],
    plan: &OverridePlan,
    values: &FormValues,
) -> Vec<FormControl> {
    let skip = plan.skip_keys();

    let generic = schema_fields
        .iter()
        .filter(|f| !skip.contains(f.key.as_str()))
        .map(|f| FormControl {
            key: f.key.clone(),
            label: f.display_label().to_string(),
            required: f.required,
            kind: ControlKind::for_schema_field(f),
            origin: ControlOrigin::Schema,
            value: values.get(&f.key).clone(),
        });

    let overrides = plan.visible_fields().map(|f| FormControl {
        key: f.key.to_string(),
        label: f.label.to_string(),
        required: f.required,
        kind: ControlKind::for_override(f, plan),
        origin: ControlOrigin::Override,
        value: values.get(f.key).clone(),
    });

    generic.chain(overrides).collect()
}

/// Control kind for `key` under the given schema and plan.
///
/// Override fields take precedence over schema fields with the same key.
#[must_use]
pub fn control_kind_for(
    key: &str,
    schema_fields: &[SchemaField],
    plan: &OverridePlan,
) -> Option<ControlKind> {
    if let Some(field) = plan.field(key) {
        return Some(ControlKind::for_override(field, plan));
    }
    schema_fields
        .iter()
        .find(|f| f.key == key)
        .map(ControlKind::for_schema_field)
}
