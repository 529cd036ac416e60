//! Authentication module
//!
//! This module provides authentication functionality including:
//! - The identity verifier capability and its implementations
//! - Firebase ID token verification
//! - Shared-secret JWTs for local development
//! - Authentication middleware

pub mod firebase;
pub mod jwt;
pub mod middleware;
pub mod verifier;

pub use firebase::{FirebaseVerifier, ServiceAccount};
pub use jwt::{generate_token, SharedSecretVerifier};
pub use middleware::{authenticate, AuthUser};
pub use verifier::{build_verifier, Identity, IdentityVerifier, UnconfiguredVerifier};
