//! Report Autocomplete Service Library
//!
//! An authenticated HTTP service that suggests report phrases starting with
//! what the user has typed so far.

pub mod api;
pub mod auth;
pub mod core;
pub mod suggest;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{AutocompleteError, Config};
pub use suggest::{suggest, Corpus};
