//! The per-request authentication pipeline.
//!
//! [`AuthGate`] sequences exclusion matching, bearer extraction, unverified
//! header inspection, signing-key resolution, verification, and identity
//! projection. Stages execute strictly in order; any failure short-circuits
//! into an error the middleware maps to a uniform 401.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::UserIdentity;
use crate::jwt::header::{extract_bearer, read_unverified_header};
use crate::jwt::key_cache::SigningKeyCache;
use crate::jwt::verifier::TokenVerifier;
use http::HeaderMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Terminal outcome of a pipeline run that did not reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The path matched an exclusion prefix; no identity was established.
    Skipped,
    /// The credential verified; carry this identity downstream.
    Authenticated(UserIdentity),
}

/// Request-time authentication gate.
///
/// Constructed once at startup from an immutable [`AuthConfig`] and shared
/// across requests; the signing-key cache inside is the only mutable state.
pub struct AuthGate {
    config: Arc<AuthConfig>,
    key_cache: SigningKeyCache,
    verifier: TokenVerifier,
}

impl AuthGate {
    /// Builds a gate from validated configuration.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let config = Arc::new(config);
        let key_cache = SigningKeyCache::new(&config)?;
        let verifier = TokenVerifier::new(Arc::clone(&config));
        Ok(Self {
            config,
            key_cache,
            verifier,
        })
    }

    /// The configuration this gate was built with.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The signing-key cache, exposed for observability.
    #[must_use]
    pub fn key_cache(&self) -> &SigningKeyCache {
        &self.key_cache
    }

    /// Runs the authentication pipeline for one request.
    ///
    /// Stage order: exclusion check, bearer extraction, unverified header
    /// read, key resolution, verification, identity projection. The JWKS
    /// fetch inside key resolution is the only suspension point.
    #[instrument(skip(self, headers), fields(path = %path))]
    pub async fn authenticate(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<AuthOutcome, AuthError> {
        if self.config.exclude_paths.is_excluded(path) {
            debug!("path excluded from authentication");
            return Ok(AuthOutcome::Skipped);
        }

        let token = extract_bearer(headers).ok_or(AuthError::NoToken)?;
        let header = read_unverified_header(token)?;
        let key = self.key_cache.resolve(&header.key_id).await?;
        let claims = self.verifier.verify(token, &key, &header)?;

        let identity = UserIdentity::project(&claims);
        debug!(username = %identity.username, "request authenticated");
        Ok(AuthOutcome::Authenticated(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn gate_excluding(spec: &str) -> AuthGate {
        let config = AuthConfig::new(
            Url::parse("https://idp.example.com/keys").unwrap(),
            "urn:api",
            "https://idp.example.com",
        )
        .unwrap()
        .with_exclude_paths(spec);
        AuthGate::new(config).unwrap()
    }

    #[tokio::test]
    async fn excluded_path_skips_without_touching_headers() {
        let gate = gate_excluding("/ping;/login/;/public/");
        let mut headers = HeaderMap::new();
        // Garbage credentials must not matter on an excluded path.
        headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Bearer not-a-token"),
        );

        let outcome = gate.authenticate("/ping", &headers).await.unwrap();
        assert_eq!(outcome, AuthOutcome::Skipped);
    }

    #[tokio::test]
    async fn protected_path_without_token_rejects_before_any_io() {
        let gate = gate_excluding("/ping");
        let err = gate
            .authenticate("/widgets", &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoToken));
        assert_eq!(gate.key_cache().key_count().await, 0);
    }

    #[tokio::test]
    async fn basic_scheme_counts_as_no_token() {
        let gate = gate_excluding("");
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Basic abc123"),
        );

        let err = gate.authenticate("/widgets", &headers).await.unwrap_err();
        assert!(matches!(err, AuthError::NoToken));
        assert_eq!(err.to_string(), "No JWT token provided.");
    }

    #[tokio::test]
    async fn malformed_token_rejects_before_key_resolution() {
        let gate = gate_excluding("");
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Bearer definitely-not-a-jwt"),
        );

        let err = gate.authenticate("/widgets", &headers).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken { .. }));
        assert_eq!(gate.key_cache().key_count().await, 0);
    }
}
