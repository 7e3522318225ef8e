//! Listing create, edit, update and remove, plus moderation flags.
//!
//! The caller's identity arrives in the `x-owner-id` header, set by the
//! authenticating proxy in front of this service.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bazaar_core::ListingDraft;

use super::{submit_error_response, unauthenticated, AppState};

/// Header carrying the authenticated owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

fn owner_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `POST /listings`
pub async fn create_listing_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ListingDraft>,
) -> Response {
    let Some(owner) = owner_id(&headers) else {
        return unauthenticated();
    };
    match state.listings.create(owner, draft).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(e) => submit_error_response(&e, state.listings.config().debug_diagnostics),
    }
}

/// `GET /listings/{id}/edit`
pub async fn edit_listing_handler(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(owner) = owner_id(&headers) else {
        return unauthenticated();
    };
    match state.listings.load_for_edit(owner, &listing_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => submit_error_response(&e, state.listings.config().debug_diagnostics),
    }
}

/// `PUT /listings/{id}`
pub async fn update_listing_handler(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
    Json(draft): Json<ListingDraft>,
) -> Response {
    let Some(owner) = owner_id(&headers) else {
        return unauthenticated();
    };
    match state.listings.update(owner, &listing_id, draft).await {
        Ok(listing) => Json(listing).into_response(),
        Err(e) => submit_error_response(&e, state.listings.config().debug_diagnostics),
    }
}

/// `DELETE /listings/{id}`
pub async fn remove_listing_handler(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(owner) = owner_id(&headers) else {
        return unauthenticated();
    };
    match state.listings.remove(owner, &listing_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => submit_error_response(&e, state.listings.config().debug_diagnostics),
    }
}

/// `GET /moderation/flags`
pub async fn abuse_flags_handler(State(state): State<AppState>) -> Response {
    Json(state.abuse.flags()).into_response()
}
