//! Suggestion matching
//!
//! A fixed [`Corpus`] loaded at startup and the pure [`suggest`] function that
//! ranks its phrases against a query.

pub mod corpus;
pub mod matcher;

pub use corpus::{Corpus, DEFAULT_CORPUS};
pub use matcher::{suggest, MAX_SUGGESTIONS};
