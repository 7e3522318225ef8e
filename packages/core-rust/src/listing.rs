//! Listing documents and submitted drafts.

use serde::{Deserialize, Deserializer, Serialize};

use crate::form::FormValues;
use crate::types::{AttributeMap, AttributeValue};
use crate::validate::ValidationError;

/// Maximum listing title length in characters.
pub const MAX_TITLE_LENGTH: usize = 120;

/// A stored listing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Main category id; for main categories this is the slug the
    /// override family is resolved from.
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, deserialize_with = "lenient_attributes")]
    pub attributes: AttributeMap,
    /// Version of the schema the attributes were saved against.
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

/// Reads an attributes object, dropping members that are not valid
/// attribute values (nulls, nested objects) instead of failing the listing.
fn lenient_attributes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AttributeMap, D::Error> {
    let raw = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(|(k, v)| AttributeValue::from_json(v).map(|a| (k.clone(), a)))
        .collect())
}

/// The listing form as submitted for create or update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category_id: String,
    #[serde(default)]
    pub sub_category_id: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Raw attribute inputs keyed by field key.
    #[serde(default, deserialize_with = "lenient_attributes")]
    pub attributes: AttributeMap,
}

impl ListingDraft {
    /// Form values bound from the submitted attributes.
    #[must_use]
    pub fn form_values(&self) -> FormValues {
        FormValues::from_attributes(&self.attributes)
    }

    /// Checks the flat (non-attribute) fields.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: title, then price, then category.
    pub fn validate_flat_fields(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::Required {
                key: "title".into(),
                label: "Başlık".into(),
            });
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ValidationError::TooLong {
                key: "title".into(),
                label: "Başlık".into(),
                max_length: MAX_TITLE_LENGTH,
            });
        }
        if !self.price.is_finite() {
            return Err(ValidationError::NotANumber {
                key: "price".into(),
                label: "Fiyat".into(),
            });
        }
        if self.price < 0.0 {
            return Err(ValidationError::BelowMin {
                key: "price".into(),
                label: "Fiyat".into(),
                min: 0.0,
            });
        }
        if self.category_id.trim().is_empty() {
            return Err(ValidationError::Required {
                key: "categoryId".into(),
                label: "Kategori".into(),
            });
        }
        Ok(())
    }
}
