//! HTTP handlers and the shared [`AppState`].

pub mod categories;
pub mod health;
pub mod listings;

pub use categories::{category_form_handler, category_stats_handler, list_categories_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use listings::{
    abuse_flags_handler, create_listing_handler, edit_listing_handler, remove_listing_handler,
    update_listing_handler,
};

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bazaar_core::ClockSource;
use serde_json::{json, Map, Value};
use tracing::error;

use super::ShutdownController;
use crate::observers::{
    AbuseHeuristicObserver, CategoryStatsObserver, CompositeListingObserver, ListingObserver,
};
use crate::service::{ListingService, ServerConfig, SubmitError};
use crate::traits::DocumentStore;

/// Shared state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub listings: ListingService,
    pub stats: Arc<CategoryStatsObserver>,
    pub abuse: Arc<AbuseHeuristicObserver>,
    pub shutdown: Arc<ShutdownController>,
    pub start_time: Instant,
}

impl AppState {
    /// Wires the listing service with the stats and abuse observers.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: ServerConfig,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        let stats = Arc::new(CategoryStatsObserver::new());
        let abuse = Arc::new(AbuseHeuristicObserver::new(config.abuse, Arc::clone(&clock)));
        let observer = CompositeListingObserver::new(vec![
            Arc::clone(&stats) as Arc<dyn ListingObserver>,
            Arc::clone(&abuse) as Arc<dyn ListingObserver>,
        ]);
        let listings = ListingService::new(store, Arc::new(config), Arc::new(observer), clock);
        Self {
            listings,
            stats,
            abuse,
            shutdown: Arc::new(ShutdownController::new()),
            start_time: Instant::now(),
        }
    }
}

/// Maps a [`SubmitError`] to its HTTP response.
///
/// The body always carries one localized `error` message. Validation
/// failures add the offending `field`; internal failures add `diagnostics`
/// only when `debug_diagnostics` is on.
pub(crate) fn submit_error_response(err: &SubmitError, debug_diagnostics: bool) -> Response {
    let status = match err {
        SubmitError::SchemaRequired { .. } | SubmitError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SubmitError::NotFound { .. } => StatusCode::NOT_FOUND,
        SubmitError::Forbidden { .. } => StatusCode::FORBIDDEN,
        SubmitError::Write { .. } | SubmitError::Corrupt { .. } | SubmitError::Store(_) => {
            error!(error = ?err, "Listing request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let mut body = Map::new();
    body.insert("error".into(), Value::String(err.user_message()));
    if let SubmitError::Validation(v) = err {
        body.insert("field".into(), Value::String(v.key().to_string()));
    }
    if debug_diagnostics && !err.is_user_error() {
        body.insert("diagnostics".into(), err.diagnostics());
    }
    (status, Json(Value::Object(body))).into_response()
}

/// 401 for requests without an owner identity.
pub(crate) fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Bu işlem için oturum açmanız gerekiyor."})),
    )
        .into_response()
}
