//! Cryptographic and claims verification.

use crate::config::AuthConfig;
use crate::error::{sanitize_message, AuthError};
use crate::jwt::claims::VerifiedClaims;
use crate::jwt::header::UnverifiedHeader;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

/// Asymmetric signature algorithms the gate will verify.
///
/// The token header names the algorithm, but the header is attacker
/// controlled; accepting an arbitrary algorithm (notably the HMAC family,
/// which would turn the public key into a shared secret) is a classic JWT
/// pitfall. Verification is restricted to the families our JWKS key
/// material can represent.
const ALLOWED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// Verifies signature, audience, issuer, and expiration per configuration.
pub struct TokenVerifier {
    config: Arc<AuthConfig>,
}

impl TokenVerifier {
    /// Creates a verifier bound to the gate configuration.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// Verifies `token` against `key` using the algorithm named in the
    /// unverified header.
    ///
    /// Checks, in order: algorithm allow-list, signature, `aud` equals the
    /// configured audience, `iss` equals the configured issuer, and `exp`
    /// in the future unless `ignore_expiration` is set, in which case
    /// expiration is not checked at all. Any failed check yields the single
    /// [`AuthError::InvalidToken`] kind; callers are not told which check
    /// failed.
    pub fn verify(
        &self,
        token: &str,
        key: &DecodingKey,
        header: &UnverifiedHeader,
    ) -> Result<VerifiedClaims, AuthError> {
        if !ALLOWED_ALGORITHMS.contains(&header.algorithm) {
            return Err(AuthError::InvalidToken {
                reason: format!("algorithm {:?} not in allow-list", header.algorithm),
            });
        }

        let mut validation = Validation::new(header.algorithm);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        // "In the future" means exactly that; no clock-skew grace.
        validation.leeway = 0;

        if self.config.ignore_expiration {
            validation.validate_exp = false;
            validation.required_spec_claims.remove("exp");
        }

        let data = decode::<VerifiedClaims>(token, key, &validation).map_err(|e| {
            AuthError::InvalidToken {
                reason: sanitize_message(&e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}
