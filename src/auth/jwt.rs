//! HS256 tokens signed with a shared secret
//!
//! Used for local development and tests in place of the hosted identity provider.

use crate::auth::verifier::{identity_from_claims, Identity, IdentityVerifier};
use crate::core::error::{AutocompleteError, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Generate a token for `uid`, valid for `ttl`
pub fn generate_token(
    uid: &str,
    email: Option<&str>,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AutocompleteError::AuthenticationError("Failed to calculate expiration".to_string()))?;

    let claims = Claims {
        sub: uid.to_string(),
        email: email.map(str::to_string),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AutocompleteError::AuthenticationError(format!("Failed to generate token: {}", e)))
}

/// Verifier for tokens produced by [`generate_token`]
pub struct SharedSecretVerifier {
    key: DecodingKey,
    validation: Validation,
    leeway: u64,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str, leeway: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = leeway;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            leeway,
        }
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let token_data = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| AutocompleteError::AuthenticationError(format!("Invalid token: {}", e)))?;

        identity_from_claims(token_data.claims, self.leeway)
    }

    fn provider(&self) -> &'static str {
        "shared_secret"
    }
}
