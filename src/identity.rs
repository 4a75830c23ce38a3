//! Verified identity projected from token claims.

use crate::jwt::claims::VerifiedClaims;
use serde::{Deserialize, Serialize};

/// Minimal user identity handed to downstream handlers.
///
/// Constructed once per authenticated request and written into a
/// per-request extension slot; unset when the path was excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Common name, from the `cn` claim.
    pub username: String,
    /// Principal name, from the `upn` claim.
    pub email: String,
}

impl UserIdentity {
    /// Projects verified claims onto an identity.
    ///
    /// Pure and infallible: missing source claims default to empty strings.
    /// Projection must never be the reason a request is rejected once
    /// verification has already succeeded.
    #[must_use]
    pub fn project(claims: &VerifiedClaims) -> Self {
        Self {
            username: claims.cn.clone().unwrap_or_default(),
            email: claims.upn.clone().unwrap_or_default(),
        }
    }
}
