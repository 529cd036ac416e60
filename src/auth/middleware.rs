//! Authentication middleware

use crate::api::handlers::AppState;
use crate::auth::verifier::Identity;
use crate::core::error::{AutocompleteError, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Extension to store authenticated user info in request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
        }
    }
}

/// Authentication middleware
///
/// Verifies the bearer token with the configured identity verifier before the
/// wrapped handler runs. On failure the handler is never invoked and the client
/// gets a 401 with a `WWW-Authenticate: Bearer` challenge.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => return e.into_response(),
    };

    let identity = match state.verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    debug!(
        uid = %identity.uid,
        provider = state.verifier.provider(),
        "Request authenticated"
    );

    request.extensions_mut().insert(AuthUser::from(identity));

    next.run(request).await
}

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AutocompleteError::AuthenticationError("Not authenticated".to_string()))?
        .to_str()
        .map_err(|_| AutocompleteError::AuthenticationError("Malformed Authorization header".to_string()))?;

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AutocompleteError::AuthenticationError(
            "Invalid authentication scheme, expected 'Authorization: Bearer <token>'".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AutocompleteError::AuthenticationError("Empty bearer token".to_string()));
    }

    Ok(token)
}

// Implement FromRequestParts for AuthUser to enable extraction in handlers
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AutocompleteError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AutocompleteError::AuthenticationError("User not authenticated".to_string()))
    }
}
