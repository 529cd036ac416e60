//! Configuration management

use axum::http::HeaderValue;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use config::{builder::DefaultState, Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError as BuilderError, Environment, File};
use clap::Parser;

use crate::suggest::corpus::DEFAULT_CORPUS;

/// Environment variable read by the deployed service for the Firebase key file
pub const SERVICE_ACCOUNT_ENV: &str = "FIREBASE_SERVICE_ACCOUNT_PATH";

/// Google's JWKS for Firebase ID token signing keys
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Upper bound for `identity.key_cache_ttl` (one day)
pub const MAX_KEY_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Upper bound for `identity.leeway`
pub const MAX_LEEWAY_SECS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Invalid identity configuration: {0}")]
    InvalidIdentity(String),

    #[error("Invalid suggestions configuration: {0}")]
    InvalidSuggestions(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_args(CliArgs::parse())
    }

    /// Same as [`Config::load`] with already parsed arguments
    pub fn load_with_args(cli_args: CliArgs) -> Result<Self, ConfigError> {
        // 1. Defaults (lowest priority)
        let mut builder = with_defaults(ConfigBuilder::builder())?;

        // 2. Config file (medium priority)
        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string()
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // 3. Environment variables (higher priority)
        // Example: AUTOCOMPLETE_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("AUTOCOMPLETE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
        );

        // 4. CLI arguments (highest priority)
        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }
        if let Some(corpus) = &cli_args.corpus {
            builder = builder.set_override("suggestions.corpus_file", corpus.display().to_string())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = with_defaults(ConfigBuilder::builder())?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// Identity credential material is not checked here. A missing or broken
    /// key file is reported when the verifier is built, and startup continues.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        self.identity.validate()?;
        self.suggestions.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                request_timeout: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                output: "stdout".to_string(),
                log_file: None,
                rotation: "daily".to_string(),
            },
            security: SecurityConfig {
                allowed_origin: "http://localhost:3000".to_string(),
            },
            identity: IdentityConfig {
                provider: IdentityProvider::Firebase,
                service_account_path: None,
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                key_cache_ttl: 3600,
                jwt_secret: None,
                leeway: 60,
            },
            suggestions: SuggestionsConfig::default(),
        }
    }
}

fn with_defaults(builder: Builder<DefaultState>) -> Result<Builder<DefaultState>, ConfigError> {
    let mut builder = builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("server.request_timeout", 30)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "json")?
        .set_default("logging.output", "stdout")?
        .set_default("logging.rotation", "daily")?
        .set_default("security.allowed_origin", "http://localhost:3000")?
        .set_default("identity.provider", "firebase")?
        .set_default("identity.jwks_url", DEFAULT_JWKS_URL)?
        .set_default("identity.key_cache_ttl", 3600)?
        .set_default("identity.leeway", 60)?;

    // The deployed service is pointed at its key file through this variable
    if let Ok(path) = std::env::var(SERVICE_ACCOUNT_ENV) {
        if !path.is_empty() {
            builder = builder.set_default("identity.service_account_path", path)?;
        }
    }

    Ok(builder)
}

/// Command-line arguments for configuration override
#[derive(Debug, Default, Parser)]
#[command(name = "report-autocomplete")]
#[command(about = "Authenticated autocomplete service for report phrases", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Suggestion corpus file, one phrase per line
    #[arg(long, value_name = "FILE")]
    pub corpus: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64, // seconds
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidServer("request_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub rotation: String,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string()
            ));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.rotation.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("rotation must be one of: {:?}", valid_rotations)
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// The single origin allowed to call the service cross-origin
    pub allowed_origin: String,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origin.is_empty() {
            return Err(ConfigError::InvalidSecurity("allowed_origin cannot be empty".to_string()));
        }

        // Credentials are allowed, which browsers refuse together with a wildcard
        if self.allowed_origin == "*" {
            return Err(ConfigError::InvalidSecurity(
                "allowed_origin must be a concrete origin, not '*'".to_string()
            ));
        }

        if !(self.allowed_origin.starts_with("http://") || self.allowed_origin.starts_with("https://")) {
            return Err(ConfigError::InvalidSecurity(
                format!("allowed_origin must start with http:// or https://: {}", self.allowed_origin)
            ));
        }

        if HeaderValue::from_str(&self.allowed_origin).is_err() {
            return Err(ConfigError::InvalidSecurity(
                format!("allowed_origin is not a valid header value: {}", self.allowed_origin)
            ));
        }

        Ok(())
    }
}

/// Which identity verifier to build at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProvider {
    /// Firebase Authentication ID tokens (RS256, Google-managed keys)
    Firebase,
    /// HS256 tokens signed with `identity.jwt_secret`
    SharedSecret,
}

impl IdentityProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProvider::Firebase => "firebase",
            IdentityProvider::SharedSecret => "shared_secret",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub provider: IdentityProvider,
    pub service_account_path: Option<PathBuf>,
    pub jwks_url: String,
    pub key_cache_ttl: u64, // seconds
    pub jwt_secret: Option<String>,
    pub leeway: u64, // seconds
}

impl IdentityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwks_url.is_empty() {
            return Err(ConfigError::InvalidIdentity("jwks_url cannot be empty".to_string()));
        }

        if self.key_cache_ttl == 0 {
            return Err(ConfigError::InvalidIdentity("key_cache_ttl must be greater than 0".to_string()));
        }

        if self.key_cache_ttl > MAX_KEY_CACHE_TTL_SECS {
            return Err(ConfigError::InvalidIdentity(format!(
                "key_cache_ttl cannot exceed {} seconds",
                MAX_KEY_CACHE_TTL_SECS
            )));
        }

        if self.leeway > MAX_LEEWAY_SECS {
            return Err(ConfigError::InvalidIdentity(format!(
                "leeway cannot exceed {} seconds",
                MAX_LEEWAY_SECS
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsConfig {
    #[serde(default = "default_corpus")]
    pub corpus: Vec<String>,
    pub corpus_file: Option<PathBuf>,
}

fn default_corpus() -> Vec<String> {
    DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect()
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            corpus: default_corpus(),
            corpus_file: None,
        }
    }
}

impl SuggestionsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.corpus_file {
            Some(path) if path.as_os_str().is_empty() => Err(ConfigError::InvalidSuggestions(
                "corpus_file cannot be empty".to_string()
            )),
            Some(_) => Ok(()),
            None if self.corpus.iter().all(|s| s.trim().is_empty()) => Err(ConfigError::InvalidSuggestions(
                "corpus must contain at least one phrase".to_string()
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.security.allowed_origin, "http://localhost:3000");
        assert_eq!(config.suggestions.corpus.len(), DEFAULT_CORPUS.len());
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[security]
allowed_origin = "https://reports.example.com"

[identity]
provider = "shared_secret"
jwt_secret = "dev-secret"

[suggestions]
corpus = ["Alpha", "Beta"]
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.security.allowed_origin, "https://reports.example.com");
        assert_eq!(config.identity.provider, IdentityProvider::SharedSecret);
        assert_eq!(config.identity.jwt_secret.as_deref(), Some("dev-secret"));
        assert_eq!(config.suggestions.corpus, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(Path::new("/nonexistent/autocomplete.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_wildcard_origin_rejected() {
        let mut config = Config::default();
        config.security.allowed_origin = "*".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSecurity(_))));
    }

    #[test]
    fn test_origin_without_scheme_rejected() {
        let mut config = Config::default();
        config.security.allowed_origin = "localhost:3000".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSecurity(_))));
    }

    #[test]
    fn test_invalid_logging_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogging(_))));

        let mut config = Config::default();
        config.logging.output = "file".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogging(_))));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let mut config = Config::default();
        config.suggestions.corpus = vec!["   ".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSuggestions(_))));

        config.suggestions.corpus_file = Some(PathBuf::from("phrases.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_do_not_fail_validation() {
        let mut config = Config::default();
        config.identity.service_account_path = None;
        config.identity.provider = IdentityProvider::SharedSecret;
        config.identity.jwt_secret = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.server.request_timeout = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidServer(_))));
    }

    #[test]
    fn test_identity_bounds() {
        let mut config = Config::default();
        config.identity.key_cache_ttl = MAX_KEY_CACHE_TTL_SECS;
        config.identity.leeway = MAX_LEEWAY_SECS;
        assert!(config.validate().is_ok());

        config.identity.key_cache_ttl = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidIdentity(_))));

        config.identity.key_cache_ttl = 3600;
        config.identity.leeway = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidIdentity(_))));
    }
}
