//! Firebase Authentication ID token verification
//!
//! ID tokens are RS256 JWTs signed by Google. Verification needs:
//! - the project id, read from the service account key file
//! - Google's published signing keys (JWKS), fetched over HTTPS and cached
//!   for as long as the response's `Cache-Control: max-age` allows

use crate::auth::verifier::{identity_from_claims, Identity, IdentityVerifier};
use crate::core::config::MAX_KEY_CACHE_TTL_SECS;
use crate::core::error::{AutocompleteError, Result};
use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// The parts of a service account key file the verifier needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccount {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AutocompleteError::ConfigError(format!(
                "service account key file not found: {}",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            AutocompleteError::ConfigError(format!(
                "failed to read service account key file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let account: ServiceAccount = serde_json::from_str(text).map_err(|e| {
            AutocompleteError::ConfigError(format!("invalid service account key file: {}", e))
        })?;

        if account.account_type != "service_account" {
            return Err(AutocompleteError::ConfigError(format!(
                "expected a key of type \"service_account\", found \"{}\"",
                account.account_type
            )));
        }

        if account.project_id.is_empty() {
            return Err(AutocompleteError::ConfigError(
                "service account key file has an empty project_id".to_string(),
            ));
        }

        Ok(account)
    }
}

/// Longest time a fetched key set is trusted, whatever the response says
pub const MAX_KEY_CACHE_TTL: Duration = Duration::from_secs(MAX_KEY_CACHE_TTL_SECS);

/// Minimum age of the cached key set before an unknown `kid` may trigger a refetch
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

enum Lookup {
    Hit(DecodingKey),
    Miss,
    Stale,
}

impl CachedKeys {
    fn lookup(&self, kid: &str, now: Instant) -> Result<Lookup> {
        if self.expires_at <= now {
            return Ok(Lookup::Stale);
        }

        match self.keys.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map(Lookup::Hit)
                .map_err(|e| AutocompleteError::AuthenticationError(format!("unusable signing key: {}", e))),
            // Keys may have rotated, but only look again once the set has aged
            None if now.saturating_duration_since(self.fetched_at) < MIN_REFRESH_INTERVAL => Ok(Lookup::Miss),
            None => Ok(Lookup::Stale),
        }
    }
}

fn unknown_kid(kid: &str) -> AutocompleteError {
    AutocompleteError::AuthenticationError(format!("no signing key matches kid \"{}\"", kid))
}

/// Signing keys fetched from a JWKS endpoint
pub struct KeyStore {
    client: reqwest::Client,
    url: String,
    default_ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl KeyStore {
    pub fn new(url: impl Into<String>, default_ttl: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AutocompleteError::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            default_ttl: default_ttl.min(MAX_KEY_CACHE_TTL),
            cache: RwLock::new(None),
        })
    }

    /// Find the key for `kid`
    ///
    /// The key set is refetched when it has expired, or when `kid` is unknown
    /// and the set is older than [`MIN_REFRESH_INTERVAL`]. Concurrent callers
    /// share a single refetch.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            match cached.lookup(kid, Instant::now())? {
                Lookup::Hit(key) => return Ok(key),
                Lookup::Miss => return Err(unknown_kid(kid)),
                Lookup::Stale => {}
            }
        }

        let mut guard = self.cache.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(cached) = guard.as_ref() {
            match cached.lookup(kid, Instant::now())? {
                Lookup::Hit(key) => return Ok(key),
                Lookup::Miss => return Err(unknown_kid(kid)),
                Lookup::Stale => {}
            }
        }

        let fresh = self.fetch().await?;
        let found = fresh.lookup(kid, Instant::now());
        *guard = Some(fresh);

        match found? {
            Lookup::Hit(key) => Ok(key),
            Lookup::Miss | Lookup::Stale => Err(unknown_kid(kid)),
        }
    }

    async fn fetch(&self) -> Result<CachedKeys> {
        let fetch_error = |e: reqwest::Error| {
            AutocompleteError::AuthenticationError(format!("failed to fetch signing keys: {}", e))
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?;

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(self.default_ttl);

        let keys: JwkSet = response.json().await.map_err(fetch_error)?;

        info!(
            url = %self.url,
            keys = keys.keys.len(),
            ttl_secs = ttl.as_secs(),
            "Refreshed identity provider signing keys"
        );

        let fetched_at = Instant::now();
        let expires_at = fetched_at
            .checked_add(ttl)
            .or_else(|| fetched_at.checked_add(MIN_REFRESH_INTERVAL))
            .unwrap_or(fetched_at);

        Ok(CachedKeys {
            keys,
            fetched_at,
            expires_at,
        })
    }
}

/// Extract `max-age` from a `Cache-Control` header value, capped at [`MAX_KEY_CACHE_TTL`]
fn parse_max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_KEY_CACHE_TTL))
}

/// Verifies Firebase ID tokens for one project
pub struct FirebaseVerifier {
    project_id: String,
    keys: KeyStore,
    validation: Validation,
    leeway: u64,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str, jwks_url: &str, key_cache_ttl: Duration, leeway: u64) -> Result<Self> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("{}{}", ISSUER_PREFIX, project_id)]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.leeway = leeway;

        Ok(Self {
            project_id: project_id.to_string(),
            keys: KeyStore::new(jwks_url, key_cache_ttl)?,
            validation,
            leeway,
        })
    }

    /// Build a verifier for the project named in a service account key file
    pub fn from_service_account(
        path: &Path,
        jwks_url: &str,
        key_cache_ttl: Duration,
        leeway: u64,
    ) -> Result<Self> {
        let account = ServiceAccount::from_file(path)?;
        info!(
            project_id = %account.project_id,
            client_email = ?account.client_email,
            "Loaded Firebase service account"
        );
        Self::new(&account.project_id, jwks_url, key_cache_ttl, leeway)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let header = decode_header(token)
            .map_err(|e| AutocompleteError::AuthenticationError(format!("malformed token: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AutocompleteError::AuthenticationError(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let kid = header.kid.ok_or_else(|| {
            AutocompleteError::AuthenticationError("token header has no \"kid\"".to_string())
        })?;

        let key = self.keys.decoding_key(&kid).await?;

        let token_data = decode::<Map<String, Value>>(token, &key, &self.validation)
            .map_err(|e| AutocompleteError::AuthenticationError(format!("Invalid token: {}", e)))?;

        let identity = identity_from_claims(token_data.claims, self.leeway)?;
        debug!(uid = %identity.uid, "Verified Firebase ID token");
        Ok(identity)
    }

    fn provider(&self) -> &'static str {
        "firebase"
    }
}
