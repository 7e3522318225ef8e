//! Category lists, form rendering and category statistics.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{submit_error_response, AppState};

#[derive(Debug, Deserialize)]
pub struct CategoryListParams {
    /// Parent id; main categories when absent.
    pub parent: Option<String>,
}

/// `GET /categories?parent=`
pub async fn list_categories_handler(
    State(state): State<AppState>,
    Query(params): Query<CategoryListParams>,
) -> Response {
    match state.listings.categories(non_empty(params.parent.as_deref())).await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => submit_error_response(&e, state.listings.config().debug_diagnostics),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct FormParams {
    pub sub: Option<String>,
    pub model: Option<String>,
}

/// `GET /categories/{id}/form?sub=&model=`
pub async fn category_form_handler(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Query(params): Query<FormParams>,
) -> Response {
    let view = state
        .listings
        .form(
            &category_id,
            non_empty(params.sub.as_deref()),
            non_empty(params.model.as_deref()),
        )
        .await;
    Json(view).into_response()
}

/// `GET /categories/{id}/stats`
pub async fn category_stats_handler(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Response {
    Json(state.stats.snapshot(&category_id)).into_response()
}
