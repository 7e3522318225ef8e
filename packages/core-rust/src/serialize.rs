//! Flattening form values into the persisted `attributes` map.
//!
//! Empty values are omitted: an absent key means "not provided", never
//! `null`. Legacy attribute keys are understood when loading old listings
//! and are never written back.

use crate::form::FormValues;
use crate::overrides::{OverridePlan, CONSOLE_MODEL, GAME_NAME, MAX_PLAYERS, MIN_PLAYERS};
use crate::schema::{FieldType, SchemaField};
use crate::types::{AttributeMap, AttributeValue, FieldInput};
use crate::validate::is_empty_value;

/// `(modern key, legacy key)` pairs.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    (MIN_PLAYERS, "playersMin"),
    (MAX_PLAYERS, "playersMax"),
    (GAME_NAME, "boardGameName"),
    (CONSOLE_MODEL, "model"),
];

/// Coerces an input by declared type; `None` when the value is empty or
/// cannot be represented as that type.
#[must_use]
pub fn coerce_value(input: &FieldInput, field_type: FieldType) -> Option<AttributeValue> {
    if is_empty_value(input, field_type) {
        return None;
    }
    let value = input.value()?;
    match field_type {
        FieldType::Number => value.as_number().map(AttributeValue::Number),
        FieldType::Boolean => match value {
            AttributeValue::Bool(b) => Some(AttributeValue::Bool(*b)),
            _ => None,
        },
        FieldType::MultiSelect => match value {
            AttributeValue::List(items) => Some(AttributeValue::List(items.clone())),
            other => Some(AttributeValue::List(vec![other.to_display_string()])),
        },
        FieldType::Text | FieldType::Select => {
            Some(AttributeValue::Text(value.to_display_string()))
        }
    }
}

/// Builds the attributes payload for persistence.
///
/// Schema fields are written first (override-owned keys skipped), then the
/// plan's visible override fields. Hidden override fields are never written.
#[must_use]
pub fn serialize_attributes(
    values: &FormValues,
    schema_fields: &[SchemaField],
    plan: &OverridePlan,
) -> AttributeMap {
    let skip = plan.skip_keys();
    let mut out = AttributeMap::new();

    for field in schema_fields.iter().filter(|f| !skip.contains(f.key.as_str())) {
        if let Some(value) = coerce_value(values.get(&field.key), field.field_type) {
            out.insert(field.key.clone(), value);
        }
    }

    for field in plan.visible_fields() {
        if let Some(value) = coerce_value(values.get(field.key), field.kind.field_type()) {
            out.insert(field.key.to_string(), value);
        }
    }

    strip_legacy_keys(&mut out);
    out
}

/// Upgrades a stored attribute map for editing.
///
/// A legacy value is copied into its modern key only when the modern key is
/// absent. Legacy keys are removed either way.
#[must_use]
pub fn apply_legacy_aliases(stored: &AttributeMap) -> AttributeMap {
    let mut upgraded = stored.clone();
    for (modern, legacy) in LEGACY_ALIASES {
        if upgraded.contains_key(*modern) {
            continue;
        }
        if let Some(value) = stored.get(*legacy) {
            upgraded.insert((*modern).to_string(), value.clone());
        }
    }
    strip_legacy_keys(&mut upgraded);
    upgraded
}

/// Removes every legacy key from a payload.
pub fn strip_legacy_keys(attributes: &mut AttributeMap) {
    for (_, legacy) in LEGACY_ALIASES {
        attributes.remove(*legacy);
    }
}
