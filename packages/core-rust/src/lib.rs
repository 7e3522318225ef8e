//! Bazaar Core: listing attribute schemas, category overrides, form
//! rendering, validation and serialization.
//!
//! Everything here is synchronous and I/O free. Loading schemas and
//! persisting listings live in `bazaar-server`.

pub mod category;
pub mod clock;
pub mod form;
pub mod listing;
pub mod overrides;
pub mod schema;
pub mod serialize;
pub mod state;
pub mod types;
pub mod validate;

pub use category::{visible_sorted, Category, CategoryFamily, ConsoleGroup};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use form::{render_form, ControlKind, ControlOrigin, FormControl, FormValues};
pub use listing::{Listing, ListingDraft};
pub use overrides::{ConsoleFieldVisibility, OverrideField, OverrideKind, OverridePlan};
pub use schema::{FieldOption, FieldType, ListingSchemaDoc, LoadedSchema, SchemaError, SchemaField};
pub use serialize::{apply_legacy_aliases, serialize_attributes};
pub use state::{Effect, FormEvent, ListingFormState};
pub use types::{AttributeMap, AttributeValue, FieldInput};
pub use validate::{validate_attributes, validate_overrides, ValidationError};
