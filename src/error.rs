//! Error handling for the authentication pipeline.
//!
//! Four failure kinds cover every way the pipeline can reject a request.
//! All of them are converted at the middleware boundary into a uniform
//! `401 Unauthorized` response with a generic body; the original kind and
//! message are recorded in server-side logs only, sanitized of sensitive
//! substrings.

use thiserror::Error;

/// Sensitive patterns that must never appear in logged error detail.
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "credential",
    "bearer",
    "authorization",
    "private",
];

/// Authentication pipeline error.
///
/// Variants are `Clone` because key-resolution results are shared between
/// concurrent waiters of a single-flight JWKS fetch.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// No bearer token was provided on a protected path.
    #[error("No JWT token provided.")]
    NoToken,

    /// The token's header segment could not be decoded or is structurally
    /// invalid.
    #[error("Token malformed: {reason}")]
    MalformedToken {
        /// Description of the malformation.
        reason: String,
    },

    /// The signing key could not be resolved from the JWKS endpoint.
    #[error("Signing key resolution failed: {reason}")]
    KeyResolution {
        /// Description of the resolution failure.
        reason: String,
    },

    /// Signature, audience, issuer, or expiration check failed. The pipeline
    /// deliberately does not distinguish which.
    #[error("Token verification failed: {reason}")]
    InvalidToken {
        /// Description of the failed check, for server-side logs only.
        reason: String,
    },
}

/// Stable error codes for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Missing or malformed `Authorization` header.
    NoToken,
    /// Undecodable token header segment.
    MalformedToken,
    /// JWKS fetch or key lookup failure.
    KeyResolution,
    /// Signature or claims check failure.
    InvalidToken,
}

impl ErrorCode {
    /// String form used as a structured log field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "AUTH_NO_TOKEN",
            Self::MalformedToken => "AUTH_TOKEN_MALFORMED",
            Self::KeyResolution => "AUTH_KEY_RESOLUTION",
            Self::InvalidToken => "AUTH_TOKEN_INVALID",
        }
    }
}

impl AuthError {
    /// The stable code for this error kind.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoToken => ErrorCode::NoToken,
            Self::MalformedToken { .. } => ErrorCode::MalformedToken,
            Self::KeyResolution { .. } => ErrorCode::KeyResolution,
            Self::InvalidToken { .. } => ErrorCode::InvalidToken,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "JWKS fetch timed out".to_string()
        } else if err.is_connect() {
            "JWKS endpoint unreachable".to_string()
        } else {
            sanitize_message(&err.to_string())
        };
        AuthError::KeyResolution { reason }
    }
}

/// Replace a message wholesale when it contains sensitive material.
pub(crate) fn sanitize_message(message: &str) -> String {
    let lower = message.to_lowercase();
    for pattern in SENSITIVE_PATTERNS {
        if lower.contains(pattern) {
            return "detail withheld".to_string();
        }
    }
    message.to_string()
}
