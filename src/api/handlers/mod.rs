pub mod autocomplete;
pub mod system;

pub use autocomplete::*;
pub use system::*;

use crate::auth::IdentityVerifier;
use crate::suggest::Corpus;
use std::sync::Arc;

/// Shared application state for handlers
///
/// Built once at startup; both fields are read-only for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub corpus: Corpus,
    pub verifier: Arc<dyn IdentityVerifier>,
}
