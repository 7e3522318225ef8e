//! Listing form state machine.
//!
//! All category/schema/attribute coordination of the create and edit flows
//! goes through [`ListingFormState::apply`], so the reset rules live in one
//! place:
//!
//! - category changed: sub-category, model, schema and every value reset;
//!   a new schema load is requested
//! - sub-category changed: the plan is re-resolved, a model that is no longer
//!   offered is cleared, and values of override fields that became hidden
//!   are cleared
//! - console model edited: same hidden-field cleanup as above
//!
//! Schema loads are tagged with a generation number. A response for an
//! older generation arrives after the category moved on and is dropped.

use tracing::debug;

use crate::category::CategoryFamily;
use crate::form::{control_kind_for, render_form, FormControl, FormValues};
use crate::listing::Listing;
use crate::overrides::{OverridePlan, CONSOLE_MODEL};
use crate::schema::{LoadedSchema, SchemaField};
use crate::serialize::{apply_legacy_aliases, serialize_attributes};
use crate::types::{AttributeMap, AttributeValue};
use crate::validate::{validate_attributes, validate_overrides, ValidationError};

/// Input events of the listing form.
#[derive(Debug, Clone)]
pub enum FormEvent {
    /// A main category was picked.
    CategoryChanged { category_id: String, slug: String },
    /// A sub-category was picked or cleared.
    SubCategoryChanged { sub_category_id: Option<String> },
    /// A schema load finished. Failures arrive as [`LoadedSchema::absent`].
    SchemaLoaded { generation: u64, schema: LoadedSchema },
    /// The user changed one input.
    AttributeEdited { key: String, raw: AttributeValue },
    /// An existing listing was opened for editing.
    LoadedForEdit { listing: Listing },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the schema for `category_id`; answer with `SchemaLoaded`.
    LoadSchema { category_id: String, generation: u64 },
}

/// Schema slot of the form.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaState {
    /// No category selected.
    Idle,
    /// Waiting for the load tagged with this generation.
    Loading { generation: u64 },
    /// Loaded (possibly absent).
    Ready(LoadedSchema),
}

/// Selected main category with its family resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCategory {
    pub id: String,
    pub slug: String,
    pub family: CategoryFamily,
}

/// State of one create/edit form.
#[derive(Debug, Clone)]
pub struct ListingFormState {
    category: Option<SelectedCategory>,
    sub_category_id: Option<String>,
    schema: SchemaState,
    generation: u64,
    values: FormValues,
    plan: OverridePlan,
}

impl Default for ListingFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingFormState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            category: None,
            sub_category_id: None,
            schema: SchemaState::Idle,
            generation: 0,
            values: FormValues::new(),
            plan: OverridePlan::none(),
        }
    }

    /// Applies one event and returns the effect it requests, if any.
    pub fn apply(&mut self, event: FormEvent) -> Option<Effect> {
        match event {
            FormEvent::CategoryChanged { category_id, slug } => {
                let family = CategoryFamily::resolve(&slug);
                self.category = Some(SelectedCategory {
                    id: category_id.clone(),
                    slug,
                    family,
                });
                self.sub_category_id = None;
                self.values = FormValues::new();
                self.plan = OverridePlan::for_family(family, None, None);
                Some(self.request_schema(category_id))
            }
            FormEvent::SubCategoryChanged { sub_category_id } => {
                self.sub_category_id = sub_category_id.filter(|s| !s.trim().is_empty());
                self.refresh_plan();
                None
            }
            FormEvent::SchemaLoaded { generation, schema } => {
                match self.schema {
                    SchemaState::Loading { generation: current } if current == generation => {
                        self.schema = SchemaState::Ready(schema);
                    }
                    _ => {
                        debug!(generation, current = self.generation, "Dropping stale schema response");
                    }
                }
                None
            }
            FormEvent::AttributeEdited { key, raw } => {
                let Some(kind) = control_kind_for(&key, self.fields(), &self.plan) else {
                    debug!(key = %key, "Ignoring edit for a field that is not rendered");
                    return None;
                };
                if self.plan.field(&key).is_some() && !self.plan.is_visible(&key) {
                    debug!(key = %key, "Ignoring edit for a hidden override field");
                    return None;
                }
                self.values.edit(key.clone(), &kind, raw);
                if key == CONSOLE_MODEL {
                    self.refresh_plan();
                }
                None
            }
            FormEvent::LoadedForEdit { listing } => {
                let family = CategoryFamily::resolve(&listing.category_id);
                self.category = Some(SelectedCategory {
                    id: listing.category_id.clone(),
                    slug: listing.category_id.clone(),
                    family,
                });
                self.sub_category_id = listing.sub_category_id.clone();
                self.values = FormValues::from_attributes(&apply_legacy_aliases(&listing.attributes));
                self.refresh_plan();
                Some(self.request_schema(listing.category_id))
            }
        }
    }

    fn request_schema(&mut self, category_id: String) -> Effect {
        self.generation += 1;
        self.schema = SchemaState::Loading {
            generation: self.generation,
        };
        Effect::LoadSchema {
            category_id,
            generation: self.generation,
        }
    }

    /// Re-resolves the plan and clears values the new plan no longer shows.
    fn refresh_plan(&mut self) {
        let Some(family) = self.category.as_ref().map(|c| c.family) else {
            self.plan = OverridePlan::none();
            return;
        };
        let sub = self.sub_category_id.as_deref();

        let mut plan = OverridePlan::for_family(family, sub, self.values.text(CONSOLE_MODEL));
        if let Some(model) = plan.console_model() {
            if !plan.offers_model(model) {
                self.values.clear(CONSOLE_MODEL);
                plan = OverridePlan::for_family(family, sub, None);
            }
        }

        for key in plan.hidden_keys() {
            if self.values.clear(key) {
                debug!(key, "Cleared value of hidden override field");
            }
        }
        self.plan = plan;
    }

    #[must_use]
    pub fn category(&self) -> Option<&SelectedCategory> {
        self.category.as_ref()
    }

    #[must_use]
    pub fn sub_category_id(&self) -> Option<&str> {
        self.sub_category_id.as_deref()
    }

    #[must_use]
    pub fn schema_state(&self) -> &SchemaState {
        &self.schema
    }

    /// Loaded schema; `None` while idle or loading.
    #[must_use]
    pub fn schema(&self) -> Option<&LoadedSchema> {
        match &self.schema {
            SchemaState::Ready(schema) => Some(schema),
            SchemaState::Idle | SchemaState::Loading { .. } => None,
        }
    }

    /// Schema fields currently in effect; empty until a schema is ready.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        self.schema().map_or(&[], |s| s.fields.as_slice())
    }

    #[must_use]
    pub fn plan(&self) -> &OverridePlan {
        &self.plan
    }

    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Controls to render for the current state.
    #[must_use]
    pub fn controls(&self) -> Vec<FormControl> {
        render_form(self.fields(), &self.plan, &self.values)
    }

    /// Runs the generic pass, then the override pass.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_attributes(&self.values, self.fields(), &self.plan.skip_keys())?;
        validate_overrides(&self.values, &self.plan)
    }

    /// Attributes payload for the current values.
    #[must_use]
    pub fn attributes(&self) -> AttributeMap {
        serialize_attributes(&self.values, self.fields(), &self.plan)
    }
}
