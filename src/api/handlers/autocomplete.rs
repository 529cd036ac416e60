use crate::api::handlers::AppState;
use crate::api::models::{AutocompleteQuery, AutocompleteResponse};
use crate::auth::AuthUser;
use crate::core::error::{AutocompleteError, Result};
use crate::suggest::suggest;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::debug;

/// Handler for GET /autocomplete - Suggest phrases starting with the query
///
/// Only reachable after the authentication middleware has accepted the token.
pub async fn autocomplete(
    State(state): State<AppState>,
    user: AuthUser,
    query: std::result::Result<Query<AutocompleteQuery>, QueryRejection>,
) -> Result<Json<AutocompleteResponse>> {
    let Query(params) = query.map_err(|e| AutocompleteError::InvalidRequest(e.body_text()))?;

    let suggestions: Vec<String> = suggest(&params.query, &state.corpus)
        .into_iter()
        .map(str::to_string)
        .collect();

    debug!(
        uid = %user.uid,
        email = ?user.email,
        query_len = params.query.chars().count(),
        matches = suggestions.len(),
        "Autocomplete served"
    );

    Ok(Json(AutocompleteResponse { suggestions }))
}
