//! Listing create / edit / update on top of the document store.
//!
//! Submission pipeline, first failure wins:
//!
//! 1. flat fields (title, price, category)
//! 2. `schema_required` policy (absent schema rejects)
//! 3. generic schema pass, then the category override pass
//! 4. serialize attributes (blank values omitted, legacy keys stripped)
//! 5. write the listing document, then a separate `imageUrls` update
//! 6. notify listing observers
//!
//! The two writes of step 5 are independent: when the second one fails the
//! listing exists without images and the caller gets an error.

use std::fmt;
use std::sync::Arc;

use bazaar_core::overrides::CONSOLE_MODEL;
use bazaar_core::{
    apply_legacy_aliases, serialize_attributes, validate_attributes, validate_overrides,
    visible_sorted, AttributeMap, AttributeValue, Category, CategoryFamily, ClockSource,
    ConsoleFieldVisibility, ConsoleGroup, Effect, FormControl, FormEvent, FormValues, Listing,
    ListingDraft, ListingFormState, LoadedSchema, OverridePlan, ValidationError,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::observers::ListingObserver;
use crate::schema_loader::SchemaLoader;
use crate::service::config::ServerConfig;
use crate::traits::DocumentStore;

/// Generic message for failures the user cannot fix.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "İlan kaydedilirken bir hata oluştu. Lütfen daha sonra tekrar deneyin.";

/// Which write of a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// The listing document itself.
    Document,
    /// The follow-up `imageUrls` update.
    Images,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Document => "document",
            Self::Images => "images",
        })
    }
}

/// Why a submission or lookup failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Bu kategori için ilan şeması tanımlı değil.")]
    SchemaRequired { category_id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("İlan bulunamadı.")]
    NotFound { listing_id: String },

    #[error("Bu ilan üzerinde işlem yetkiniz yok.")]
    Forbidden { listing_id: String },

    #[error("listing {listing_id}: {stage} write failed")]
    Write {
        stage: WriteStage,
        listing_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("listing {listing_id}: stored document is unreadable")]
    Corrupt {
        listing_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document store read failed")]
    Store(#[source] anyhow::Error),
}

impl SubmitError {
    /// Whether the user can fix this by changing the input.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaRequired { .. }
                | Self::Validation(_)
                | Self::NotFound { .. }
                | Self::Forbidden { .. }
        )
    }

    /// The single localized message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_user_error() {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }

    /// Internal details for diagnostics, including the error chain.
    #[must_use]
    pub fn diagnostics(&self) -> Value {
        let mut chain = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        let mut details = Map::new();
        details.insert("error".into(), Value::String(self.to_string()));
        details.insert("chain".into(), Value::from(chain));
        if let Self::Write {
            stage, listing_id, ..
        } = self
        {
            details.insert("stage".into(), Value::String(stage.to_string()));
            details.insert("listingId".into(), Value::String(listing_id.clone()));
        }
        Value::Object(details)
    }
}

/// Everything a client needs to render the listing form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub schema: LoadedSchema,
    pub family: CategoryFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_group: Option<ConsoleGroup>,
    pub console_field_visibility: ConsoleFieldVisibility,
    pub model_options: Vec<String>,
    pub controls: Vec<FormControl>,
}

impl FormView {
    fn from_state(state: &ListingFormState) -> Self {
        let plan = state.plan();
        Self {
            schema: state.schema().cloned().unwrap_or_default(),
            family: plan.family(),
            console_group: plan.group(),
            console_field_visibility: plan.console_visibility(),
            model_options: plan.model_options().iter().map(|m| (*m).to_string()).collect(),
            controls: state.controls(),
        }
    }
}

/// A stored listing prepared for the edit form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditView {
    /// The listing with legacy attribute keys upgraded.
    pub listing: Listing,
    pub form: FormView,
}

/// Listing workflows over a [`DocumentStore`].
#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn DocumentStore>,
    schemas: SchemaLoader,
    config: Arc<ServerConfig>,
    observer: Arc<dyn ListingObserver>,
    clock: Arc<dyn ClockSource>,
}

impl ListingService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: Arc<ServerConfig>,
        observer: Arc<dyn ListingObserver>,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        let schemas = SchemaLoader::new(Arc::clone(&store), config.schemas_collection.clone());
        Self {
            store,
            schemas,
            config,
            observer,
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Builds the empty form for a category selection.
    ///
    /// The override family is resolved from `category_id`; `model` selects a
    /// console model so model-dependent fields show up.
    pub async fn form(
        &self,
        category_id: &str,
        sub_category_id: Option<&str>,
        model: Option<&str>,
    ) -> FormView {
        let mut state = ListingFormState::new();
        let effect = state.apply(FormEvent::CategoryChanged {
            category_id: category_id.to_string(),
            slug: category_id.to_string(),
        });
        self.run_effect(&mut state, effect).await;

        state.apply(FormEvent::SubCategoryChanged {
            sub_category_id: sub_category_id.map(str::to_string),
        });
        if let Some(model) = model {
            state.apply(FormEvent::AttributeEdited {
                key: CONSOLE_MODEL.to_string(),
                raw: AttributeValue::Text(model.to_string()),
            });
        }
        FormView::from_state(&state)
    }

    async fn run_effect(&self, state: &mut ListingFormState, effect: Option<Effect>) {
        if let Some(Effect::LoadSchema {
            category_id,
            generation,
        }) = effect
        {
            let schema = self.schemas.load(&category_id).await;
            state.apply(FormEvent::SchemaLoaded { generation, schema });
        }
    }

    /// Validates and persists a new listing.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, [`SubmitError::SchemaRequired`]
    /// under the `schema_required` policy, or a write failure.
    pub async fn create(&self, owner_id: &str, draft: ListingDraft) -> Result<Listing, SubmitError> {
        let (schema, attributes) = self.check_draft(&draft).await?;

        let id = Uuid::new_v4().to_string();
        let now = self.clock.now_ms();
        let mut listing = Listing {
            id: id.clone(),
            owner_id: owner_id.to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            price: draft.price,
            category_id: draft.category_id,
            sub_category_id: draft.sub_category_id,
            image_urls: Vec::new(),
            attributes,
            schema_version: schema.listing_version(),
            created_at_ms: now,
            updated_at_ms: now,
        };

        self.write_document(&listing).await?;

        let mut images = Map::new();
        images.insert("imageUrls".into(), Value::from(draft.image_urls.clone()));
        if let Err(source) = self
            .store
            .merge(&self.config.listings_collection, &id, images)
            .await
        {
            error!(listing_id = %id, error = %source, "Listing saved without images");
            return Err(SubmitError::Write {
                stage: WriteStage::Images,
                listing_id: id,
                source,
            });
        }
        listing.image_urls = draft.image_urls;

        info!(
            listing_id = %listing.id,
            category_id = %listing.category_id,
            attributes = listing.attributes.len(),
            "Listing created"
        );
        self.observer.on_created(&listing);
        Ok(listing)
    }

    /// Loads a listing owned by `owner_id` for editing, with legacy
    /// attribute keys upgraded and the form rendered from its values.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::NotFound`] or [`SubmitError::Forbidden`] for a
    /// missing or foreign listing, or a store/decoding failure.
    pub async fn load_for_edit(
        &self,
        owner_id: &str,
        listing_id: &str,
    ) -> Result<EditView, SubmitError> {
        let mut listing = self.fetch_owned(owner_id, listing_id).await?;
        listing.attributes = apply_legacy_aliases(&listing.attributes);

        let mut state = ListingFormState::new();
        let effect = state.apply(FormEvent::LoadedForEdit {
            listing: listing.clone(),
        });
        self.run_effect(&mut state, effect).await;

        Ok(EditView {
            listing,
            form: FormView::from_state(&state),
        })
    }

    /// Validates and replaces an existing listing owned by `owner_id`.
    ///
    /// The attributes map is replaced as a whole, so legacy keys disappear.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::NotFound`] or [`SubmitError::Forbidden`] for a
    /// missing or foreign listing, otherwise the same failures as
    /// [`ListingService::create`].
    pub async fn update(
        &self,
        owner_id: &str,
        listing_id: &str,
        draft: ListingDraft,
    ) -> Result<Listing, SubmitError> {
        let existing = self.fetch_owned(owner_id, listing_id).await?;
        let (schema, attributes) = self.check_draft(&draft).await?;

        let updated = Listing {
            id: existing.id.clone(),
            owner_id: existing.owner_id.clone(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            price: draft.price,
            category_id: draft.category_id,
            sub_category_id: draft.sub_category_id,
            image_urls: draft.image_urls,
            attributes,
            schema_version: schema.listing_version(),
            created_at_ms: existing.created_at_ms,
            updated_at_ms: self.clock.now_ms(),
        };
        self.write_document(&updated).await?;

        info!(listing_id = %updated.id, "Listing updated");
        self.observer.on_updated(&existing, &updated);
        Ok(updated)
    }

    /// Deletes a listing owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::NotFound`], [`SubmitError::Forbidden`], or a
    /// store failure.
    pub async fn remove(&self, owner_id: &str, listing_id: &str) -> Result<(), SubmitError> {
        let existing = self.fetch_owned(owner_id, listing_id).await?;
        self.store
            .delete(&self.config.listings_collection, listing_id)
            .await
            .map_err(|source| SubmitError::Write {
                stage: WriteStage::Document,
                listing_id: listing_id.to_string(),
                source,
            })?;

        info!(listing_id, "Listing removed");
        self.observer.on_removed(&existing);
        Ok(())
    }

    /// Enabled categories under `parent`, sorted for display.
    ///
    /// Category documents that fail to decode are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Store`] if the collection cannot be read.
    pub async fn categories(&self, parent: Option<&str>) -> Result<Vec<Category>, SubmitError> {
        let docs = self
            .store
            .list(&self.config.categories_collection)
            .await
            .map_err(SubmitError::Store)?;

        let categories: Vec<Category> = docs
            .into_iter()
            .filter_map(|(id, mut doc)| {
                if let Some(obj) = doc.as_object_mut() {
                    obj.entry("id").or_insert_with(|| Value::String(id.clone()));
                }
                match serde_json::from_value::<Category>(doc) {
                    Ok(category) => Some(category),
                    Err(e) => {
                        debug!(category_id = %id, error = %e, "Skipping undecodable category");
                        None
                    }
                }
            })
            .collect();

        Ok(visible_sorted(&categories, parent))
    }

    /// Runs steps 1-4 of the pipeline.
    async fn check_draft(
        &self,
        draft: &ListingDraft,
    ) -> Result<(LoadedSchema, AttributeMap), SubmitError> {
        draft.validate_flat_fields()?;

        let schema = self.schemas.load(&draft.category_id).await;
        if self.config.schema_required && !schema.exists {
            return Err(SubmitError::SchemaRequired {
                category_id: draft.category_id.clone(),
            });
        }

        let values: FormValues = draft.form_values();
        // Main category ids are their slugs; the family never comes from
        // anything the client can set independently.
        let plan = OverridePlan::resolve(
            &draft.category_id,
            draft.sub_category_id.as_deref(),
            values.text(CONSOLE_MODEL),
        );

        validate_attributes(&values, &schema.fields, &plan.skip_keys())?;
        validate_overrides(&values, &plan)?;

        let attributes = serialize_attributes(&values, &schema.fields, &plan);
        Ok((schema, attributes))
    }

    async fn fetch(&self, listing_id: &str) -> Result<Listing, SubmitError> {
        let doc = self
            .store
            .get(&self.config.listings_collection, listing_id)
            .await
            .map_err(SubmitError::Store)?
            .ok_or_else(|| SubmitError::NotFound {
                listing_id: listing_id.to_string(),
            })?;
        serde_json::from_value(doc).map_err(|source| SubmitError::Corrupt {
            listing_id: listing_id.to_string(),
            source,
        })
    }

    async fn fetch_owned(&self, owner_id: &str, listing_id: &str) -> Result<Listing, SubmitError> {
        let listing = self.fetch(listing_id).await?;
        if listing.owner_id != owner_id {
            return Err(SubmitError::Forbidden {
                listing_id: listing_id.to_string(),
            });
        }
        Ok(listing)
    }

    async fn write_document(&self, listing: &Listing) -> Result<(), SubmitError> {
        let write_err = |source: anyhow::Error| SubmitError::Write {
            stage: WriteStage::Document,
            listing_id: listing.id.clone(),
            source,
        };
        let doc = serde_json::to_value(listing).map_err(|e| write_err(e.into()))?;
        self.store
            .set(&self.config.listings_collection, &listing.id, doc)
            .await
            .map_err(|source| {
                error!(listing_id = %listing.id, error = %source, "Listing write failed");
                write_err(source)
            })
    }
}
