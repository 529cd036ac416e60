//! Report Autocomplete Service
//!
//! Serves phrase suggestions to the report editor behind bearer-token authentication.

use report_autocomplete::{api, auth, core, suggest};

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Initialize logging system based on configuration
    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Configuration loaded successfully");
    info!("Starting Report Autocomplete v{}", env!("CARGO_PKG_VERSION"));
    info!(
        host = %config.server.host,
        port = config.server.port,
        allowed_origin = %config.security.allowed_origin,
        "Server configuration"
    );

    let corpus = suggest::Corpus::load(&config.suggestions)?;
    info!(
        phrases = corpus.len(),
        source = ?config.suggestions.corpus_file,
        "Suggestion corpus loaded"
    );

    // Without a verifier every protected request is rejected
    let verifier: Arc<dyn auth::IdentityVerifier> = match auth::build_verifier(&config.identity) {
        Ok(verifier) => {
            info!(provider = verifier.provider(), "Identity verifier initialized");
            verifier
        }
        Err(e) => {
            error!(
                provider = config.identity.provider.as_str(),
                error = %e,
                "Error initializing identity verifier; authenticated requests will be rejected"
            );
            Arc::new(auth::UnconfiguredVerifier::new(e.to_string()))
        }
    };

    let state = api::AppState { corpus, verifier };

    info!("Initializing HTTP server...");
    let server_url = format!("http://{}:{}", config.server.host, config.server.port);
    let server = api::ApiServer::new(&config, state)?;

    info!(url = %server_url, "Server ready - starting to serve requests");

    // Start serving (this will block until shutdown signal)
    server.serve().await?;

    Ok(())
}
