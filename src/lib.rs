//! jwt-gate - Request-time JWT authentication gate for HTTP APIs.
//!
//! Every inbound request either matches a configured exclusion rule or must
//! carry a valid JWT bearer credential, verified against a remotely published
//! JWKS, before it reaches application logic. The verified identity is made
//! available to downstream handlers through a request extension.
//!
//! The crate is framework-agnostic at its core ([`AuthGate`] operates on a
//! request path and header map) and ships an `axum` middleware stage wiring
//! the gate into a request lifecycle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod exclude;
pub mod gate;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod telemetry;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCode};
pub use exclude::ExclusionSpec;
pub use gate::{AuthGate, AuthOutcome};
pub use identity::UserIdentity;
pub use jwt::claims::VerifiedClaims;
pub use jwt::key_cache::SigningKeyCache;
pub use middleware::{require_auth, IdentityExt};
