//! JWT handling: bearer extraction, unverified header inspection,
//! signing-key resolution, and token verification.

pub mod claims;
pub mod header;
pub mod key_cache;
pub mod verifier;

pub use claims::VerifiedClaims;
pub use header::{extract_bearer, read_unverified_header, UnverifiedHeader};
pub use key_cache::SigningKeyCache;
pub use verifier::TokenVerifier;
