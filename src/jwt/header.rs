//! Bearer-token extraction and untrusted header inspection.
//!
//! The header read exists only to select which key and algorithm to use for
//! verification. No authorization decision may be based on its contents.

use crate::error::{sanitize_message, AuthError};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::Algorithm;

/// Algorithm and key identifier decoded from a token's header segment,
/// without any trust implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedHeader {
    /// Signing algorithm named by the token.
    pub algorithm: Algorithm,
    /// Key identifier, from `kid` with `x5t` as fallback.
    pub key_id: String,
}

/// Pulls the raw compact JWT out of the `Authorization` header.
///
/// The scheme word must be exactly `Bearer` (case-sensitive), separated by
/// a single space; the remainder is returned untouched. No structural
/// validation is performed here.
#[must_use]
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme == "Bearer" {
        Some(token)
    } else {
        None
    }
}

/// Decodes the token's header segment without verifying anything.
///
/// Fails with [`AuthError::MalformedToken`] when the compact form is not
/// dot-delimited, the first segment is not valid base64url JSON, or neither
/// `kid` nor `x5t` is present.
pub fn read_unverified_header(token: &str) -> Result<UnverifiedHeader, AuthError> {
    let header = jsonwebtoken::decode_header(token).map_err(|e| AuthError::MalformedToken {
        reason: sanitize_message(&e.to_string()),
    })?;

    let key_id = header
        .kid
        .or(header.x5t)
        .ok_or_else(|| AuthError::MalformedToken {
            reason: "header carries neither kid nor x5t".to_string(),
        })?;

    Ok(UnverifiedHeader {
        algorithm: header.alg,
        key_id,
    })
}
