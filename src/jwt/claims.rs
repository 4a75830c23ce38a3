//! Claims produced by successful verification.
//!
//! A [`VerifiedClaims`] value is only ever constructed by
//! [`crate::jwt::verifier::TokenVerifier`] after signature and claims checks
//! pass; it is never built from an unverified token.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `aud` claim, which issuers encode as either a string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience value.
    One(String),
    /// Multiple audience values.
    Many(Vec<String>),
}

/// Claims decoded from a cryptographically verified token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiration, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Common name of the authenticated principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cn: Option<String>,
    /// User principal name (email-shaped) of the authenticated principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upn: Option<String>,
    /// Remaining claims, retained verbatim.
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}
