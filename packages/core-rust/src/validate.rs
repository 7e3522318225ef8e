//! Attribute validation.
//!
//! Two passes, both first-error-wins:
//!
//! 1. [`validate_attributes`]: the generic schema pass. Required fields are
//!    checked first across all fields; then every non-empty field is checked
//!    for type, bounds and option membership.
//! 2. [`validate_overrides`]: hard-coded checks for the category override
//!    fields, which never go through the schema's `required` mechanism.
//!
//! Messages are the Turkish strings shown inline in the form.

use std::collections::BTreeSet;

use crate::form::FormValues;
use crate::overrides::{OverrideKind, OverridePlan, MAX_PLAYERS, MIN_PLAYERS};
use crate::schema::{FieldType, SchemaField};
use crate::types::{AttributeValue, FieldInput};

/// A single user-facing validation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{label} alanı zorunludur.")]
    Required { key: String, label: String },

    #[error("{label} sayı olmalıdır.")]
    NotANumber { key: String, label: String },

    #[error("{label} tam sayı olmalıdır.")]
    NotAnInteger { key: String, label: String },

    #[error("{label} en az {min} olmalıdır.")]
    BelowMin { key: String, label: String, min: f64 },

    #[error("{label} en fazla {max} olmalıdır.")]
    AboveMax { key: String, label: String, max: f64 },

    #[error("{label} en fazla {max_length} karakter olabilir.")]
    TooLong {
        key: String,
        label: String,
        max_length: usize,
    },

    #[error("{label} için geçersiz seçim: {value}")]
    InvalidOption {
        key: String,
        label: String,
        value: String,
    },

    #[error("{label} evet/hayır olmalıdır.")]
    NotABoolean { key: String, label: String },

    #[error("{min_label}, {max_label} değerinden büyük olamaz.")]
    MinExceedsMax {
        key: String,
        min_label: String,
        max_label: String,
    },
}

impl ValidationError {
    /// Key of the offending field.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Required { key, .. }
            | Self::NotANumber { key, .. }
            | Self::NotAnInteger { key, .. }
            | Self::BelowMin { key, .. }
            | Self::AboveMax { key, .. }
            | Self::TooLong { key, .. }
            | Self::InvalidOption { key, .. }
            | Self::NotABoolean { key, .. }
            | Self::MinExceedsMax { key, .. } => key,
        }
    }

    /// The inline message shown to the user.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Whether an input counts as "not provided" for a field type.
///
/// - boolean: only unset/cleared (or blank text) is empty; `false` is a value
/// - multiselect: empty unless a non-empty list
/// - text/number/select: empty when unset, cleared or whitespace-only
#[must_use]
pub fn is_empty_value(input: &FieldInput, field_type: FieldType) -> bool {
    let Some(value) = input.value() else {
        return true;
    };
    match field_type {
        FieldType::Boolean => matches!(value, AttributeValue::Text(s) if s.trim().is_empty()),
        FieldType::MultiSelect | FieldType::Text | FieldType::Number | FieldType::Select => {
            value.is_blank()
        }
    }
}

/// Generic schema validation pass.
///
/// Fields whose key is in `skip` are owned by category overrides and are
/// ignored here.
///
/// # Errors
///
/// Returns the first failing check: the first empty required field, otherwise
/// the first type, bound or option violation in schema order.
pub fn validate_attributes(
    values: &FormValues,
    schema_fields: &[SchemaField],
    skip: &BTreeSet<&str>,
) -> Result<(), ValidationError> {
    let active = || schema_fields.iter().filter(|f| !skip.contains(f.key.as_str()));

    for field in active() {
        if field.required && is_empty_value(values.get(&field.key), field.field_type) {
            return Err(ValidationError::Required {
                key: field.key.clone(),
                label: field.display_label().to_string(),
            });
        }
    }

    for field in active() {
        let input = values.get(&field.key);
        if is_empty_value(input, field.field_type) {
            continue;
        }
        if let Some(value) = input.value() {
            check_schema_value(field, value)?;
        }
    }

    Ok(())
}

fn check_schema_value(field: &SchemaField, value: &AttributeValue) -> Result<(), ValidationError> {
    let key = &field.key;
    let label = field.display_label();

    match field.field_type {
        FieldType::Number => {
            let n = value.as_number().ok_or_else(|| ValidationError::NotANumber {
                key: key.clone(),
                label: label.to_string(),
            })?;
            check_bounds(key, label, n, field.min, field.max)
        }
        FieldType::Boolean => match value {
            AttributeValue::Bool(_) => Ok(()),
            _ => Err(ValidationError::NotABoolean {
                key: key.clone(),
                label: label.to_string(),
            }),
        },
        FieldType::Select => {
            let chosen = value.to_display_string();
            if field.allows(&chosen) {
                Ok(())
            } else {
                Err(ValidationError::InvalidOption {
                    key: key.clone(),
                    label: label.to_string(),
                    value: chosen,
                })
            }
        }
        FieldType::MultiSelect => {
            let AttributeValue::List(items) = value else {
                return Err(ValidationError::InvalidOption {
                    key: key.clone(),
                    label: label.to_string(),
                    value: value.to_display_string(),
                });
            };
            match items.iter().find(|item| !field.allows(item)) {
                Some(bad) => Err(ValidationError::InvalidOption {
                    key: key.clone(),
                    label: label.to_string(),
                    value: bad.clone(),
                }),
                None => Ok(()),
            }
        }
        FieldType::Text => match field.max_length {
            Some(limit) if value.to_display_string().chars().count() > limit => {
                Err(ValidationError::TooLong {
                    key: key.clone(),
                    label: label.to_string(),
                    max_length: limit,
                })
            }
            _ => Ok(()),
        },
    }
}

fn check_bounds(
    key: &str,
    label: &str,
    n: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(min) = min {
        if n < min {
            return Err(ValidationError::BelowMin {
                key: key.to_string(),
                label: label.to_string(),
                min,
            });
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(ValidationError::AboveMax {
                key: key.to_string(),
                label: label.to_string(),
                max,
            });
        }
    }
    Ok(())
}

/// Override validation pass for the plan's visible fields.
///
/// Board games additionally require `minPlayers <= maxPlayers`.
///
/// # Errors
///
/// Returns the first failing check in declared field order.
pub fn validate_overrides(values: &FormValues, plan: &OverridePlan) -> Result<(), ValidationError> {
    for field in plan.visible_fields() {
        let input = values.get(field.key);
        let field_type = field.kind.field_type();

        if is_empty_value(input, field_type) {
            if field.required {
                return Err(ValidationError::Required {
                    key: field.key.to_string(),
                    label: field.label.to_string(),
                });
            }
            continue;
        }
        let Some(value) = input.value() else {
            continue;
        };

        match field.kind {
            OverrideKind::Text { max_length } => {
                if let Some(limit) = max_length {
                    if value.to_display_string().chars().count() > limit {
                        return Err(ValidationError::TooLong {
                            key: field.key.to_string(),
                            label: field.label.to_string(),
                            max_length: limit,
                        });
                    }
                }
            }
            OverrideKind::Integer { min, max } => {
                integer_in_range(field.key, field.label, value, min, max)?;
            }
            OverrideKind::Select(options) => {
                let chosen = value.to_display_string();
                if !options.contains(&chosen.as_str()) {
                    return Err(ValidationError::InvalidOption {
                        key: field.key.to_string(),
                        label: field.label.to_string(),
                        value: chosen,
                    });
                }
            }
            OverrideKind::Model => {
                let chosen = value.to_display_string();
                if !plan.offers_model(&chosen) {
                    return Err(ValidationError::InvalidOption {
                        key: field.key.to_string(),
                        label: field.label.to_string(),
                        value: chosen,
                    });
                }
            }
            OverrideKind::Boolean => {
                if !matches!(value, AttributeValue::Bool(_)) {
                    return Err(ValidationError::NotABoolean {
                        key: field.key.to_string(),
                        label: field.label.to_string(),
                    });
                }
            }
        }
    }

    if let (Some(min_field), Some(max_field)) = (plan.field(MIN_PLAYERS), plan.field(MAX_PLAYERS)) {
        let min = values.value(MIN_PLAYERS).and_then(AttributeValue::as_number);
        let max = values.value(MAX_PLAYERS).and_then(AttributeValue::as_number);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ValidationError::MinExceedsMax {
                    key: MIN_PLAYERS.to_string(),
                    min_label: min_field.label.to_string(),
                    max_label: max_field.label.to_string(),
                });
            }
        }
    }

    Ok(())
}

// Override bounds are small integers; conversions are exact.
#[allow(clippy::cast_precision_loss)]
fn integer_in_range(
    key: &str,
    label: &str,
    value: &AttributeValue,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    let n = value.as_number().ok_or_else(|| ValidationError::NotANumber {
        key: key.to_string(),
        label: label.to_string(),
    })?;
    if n.fract() != 0.0 {
        return Err(ValidationError::NotAnInteger {
            key: key.to_string(),
            label: label.to_string(),
        });
    }
    check_bounds(key, label, n, Some(min as f64), Some(max as f64))
}
