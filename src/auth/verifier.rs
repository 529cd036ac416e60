//! Identity verification capability
//!
//! The service never inspects bearer tokens itself; it hands them to an
//! [`IdentityVerifier`] built once at startup and shared through the router state.

use crate::auth::firebase::FirebaseVerifier;
use crate::auth::jwt::SharedSecretVerifier;
use crate::core::config::{IdentityConfig, IdentityProvider};
use crate::core::error::{AutocompleteError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Longest `sub` claim accepted, matching Firebase's uid limit
const MAX_UID_LEN: usize = 128;

/// Decoded identity of the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Stable user id (`sub` claim)
    pub uid: String,
    pub email: Option<String>,
    /// Every claim carried by the token
    pub claims: Map<String, Value>,
}

/// Verifies bearer tokens issued by an external identity provider
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a bearer token, returning the caller's identity
    ///
    /// Every failure is an [`AutocompleteError::AuthenticationError`].
    async fn verify(&self, token: &str) -> Result<Identity>;

    /// Short provider name for logs
    fn provider(&self) -> &'static str;
}

/// Stand-in used when the real verifier could not be built
///
/// Rejects every token, reporting why verification is unavailable.
#[derive(Debug, Clone)]
pub struct UnconfiguredVerifier {
    reason: String,
}

impl UnconfiguredVerifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl IdentityVerifier for UnconfiguredVerifier {
    async fn verify(&self, _token: &str) -> Result<Identity> {
        Err(AutocompleteError::AuthenticationError(format!(
            "identity verifier is not configured: {}",
            self.reason
        )))
    }

    fn provider(&self) -> &'static str {
        "unconfigured"
    }
}

/// Build the verifier selected by configuration
///
/// Errors here are configuration failures; callers are expected to log them and
/// fall back to [`UnconfiguredVerifier`] rather than abort.
pub fn build_verifier(config: &IdentityConfig) -> Result<Arc<dyn IdentityVerifier>> {
    let leeway = config.leeway;

    match config.provider {
        IdentityProvider::Firebase => {
            let path = config.service_account_path.as_ref().ok_or_else(|| {
                AutocompleteError::ConfigError(
                    "FIREBASE_SERVICE_ACCOUNT_PATH environment variable not set. \
                     Set it to the path of the Firebase service account key JSON file"
                        .to_string(),
                )
            })?;

            let verifier = FirebaseVerifier::from_service_account(
                path,
                &config.jwks_url,
                Duration::from_secs(config.key_cache_ttl),
                leeway,
            )?;
            Ok(Arc::new(verifier))
        }
        IdentityProvider::SharedSecret => {
            let secret = config
                .jwt_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    AutocompleteError::ConfigError(
                        "identity.jwt_secret must be set for the shared_secret provider".to_string(),
                    )
                })?;
            Ok(Arc::new(SharedSecretVerifier::new(secret, leeway)))
        }
    }
}

/// Turn a verified claim set into an [`Identity`]
///
/// Signature, `exp`, `aud` and `iss` are checked by `jsonwebtoken`; this covers
/// the remaining rules: a usable `sub`, and `iat` / `auth_time` not in the future.
pub(crate) fn identity_from_claims(claims: Map<String, Value>, leeway: u64) -> Result<Identity> {
    let uid = match claims.get("sub").and_then(Value::as_str) {
        Some(sub) if !sub.is_empty() && sub.chars().count() <= MAX_UID_LEN => sub.to_string(),
        Some(_) => {
            return Err(AutocompleteError::AuthenticationError(
                "token has an invalid \"sub\" claim".to_string(),
            ))
        }
        None => {
            return Err(AutocompleteError::AuthenticationError(
                "token has no \"sub\" claim".to_string(),
            ))
        }
    };

    let leeway = i64::try_from(leeway).unwrap_or(i64::MAX);
    let latest = chrono::Utc::now().timestamp().saturating_add(leeway);
    for claim in ["iat", "auth_time"] {
        if let Some(issued) = claims.get(claim).and_then(Value::as_i64) {
            if issued > latest {
                return Err(AutocompleteError::AuthenticationError(format!(
                    "token \"{}\" claim is in the future",
                    claim
                )));
            }
        }
    }

    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Identity { uid, email, claims })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_rejects_everything() {
        let verifier = UnconfiguredVerifier::new("key file missing");
        let err = verifier.verify("anything").await.unwrap_err();

        assert!(matches!(err, AutocompleteError::AuthenticationError(_)));
        assert!(err.to_string().contains("key file missing"));
        assert_eq!(verifier.provider(), "unconfigured");
    }

    #[test]
    fn test_build_firebase_without_key_file() {
        let mut config = Config::default().identity;
        config.service_account_path = None;

        let err = build_verifier(&config).err().unwrap();
        assert!(matches!(err, AutocompleteError::ConfigError(_)));
        assert!(err.to_string().contains("FIREBASE_SERVICE_ACCOUNT_PATH"));
    }

    #[test]
    fn test_build_firebase_with_missing_file() {
        let mut config = Config::default().identity;
        config.service_account_path = Some("/nonexistent/service-account.json".into());

        assert!(matches!(
            build_verifier(&config),
            Err(AutocompleteError::ConfigError(_))
        ));
    }

    #[test]
    fn test_build_shared_secret() {
        let mut config = Config::default().identity;
        config.provider = IdentityProvider::SharedSecret;
        config.jwt_secret = None;
        assert!(build_verifier(&config).is_err());

        config.jwt_secret = Some("dev-secret".to_string());
        let verifier = build_verifier(&config).unwrap();
        assert_eq!(verifier.provider(), "shared_secret");
    }

    #[test]
    fn test_identity_from_claims() {
        let identity = identity_from_claims(
            claims(json!({ "sub": "user-1", "email": "doc@example.com", "iat": 0 })),
            0,
        )
        .unwrap();

        assert_eq!(identity.uid, "user-1");
        assert_eq!(identity.email.as_deref(), Some("doc@example.com"));
        assert_eq!(identity.claims["iat"], 0);
    }

    #[test]
    fn test_identity_requires_sub() {
        assert!(identity_from_claims(claims(json!({ "email": "x@example.com" })), 0).is_err());
        assert!(identity_from_claims(claims(json!({ "sub": "" })), 0).is_err());
        assert!(identity_from_claims(claims(json!({ "sub": "a".repeat(129) })), 0).is_err());
    }

    #[test]
    fn test_identity_rejects_future_issue_time() {
        let future = chrono::Utc::now().timestamp() + 3600;
        assert!(identity_from_claims(claims(json!({ "sub": "u", "iat": future })), 60).is_err());
        assert!(identity_from_claims(claims(json!({ "sub": "u", "auth_time": future })), 60).is_err());
        assert!(identity_from_claims(claims(json!({ "sub": "u", "iat": future })), 7200).is_ok());
    }

    #[test]
    fn test_identity_with_enormous_leeway() {
        let now = chrono::Utc::now().timestamp();
        assert!(identity_from_claims(claims(json!({ "sub": "u", "iat": now })), u64::MAX).is_ok());
        assert!(identity_from_claims(claims(json!({ "sub": "u", "iat": i64::MAX })), u64::MAX).is_ok());
    }
}
