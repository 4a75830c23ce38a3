//! Signing-key resolution against a remote JWKS endpoint, with a
//! process-lifetime cache and per-keyId single-flight fetch coalescing.
//!
//! The cache is the only mutable state shared across concurrent pipeline
//! executions. Reads take a shared lock; a miss coordinates through an
//! in-flight map so that at most one JWKS fetch is outstanding per distinct
//! key identifier, with concurrent waiters sharing that fetch's result.
//! Successful resolutions are cached for the process lifetime (no TTL, no
//! eviction); failures are never cached, so a later request retries.

use crate::config::AuthConfig;
use crate::error::{sanitize_message, AuthError};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

/// JSON Web Key structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, EC).
    pub kty: String,
    /// Key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// X.509 certificate SHA-1 thumbprint, the legacy key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    /// Key use (sig, enc).
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// EC x coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// EC curve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
}

impl Jwk {
    /// True when this key is identified by `key_id` via `kid` or `x5t`.
    fn matches(&self, key_id: &str) -> bool {
        self.kid.as_deref() == Some(key_id) || self.x5t.as_deref() == Some(key_id)
    }
}

/// JSON Web Key Set structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    /// List of keys.
    pub keys: Vec<Jwk>,
}

type KeyMap = Arc<RwLock<HashMap<String, Arc<DecodingKey>>>>;

/// Type alias for a shared in-flight fetch.
type InflightFetch = Shared<BoxFuture<'static, Result<Arc<DecodingKey>, AuthError>>>;

/// Signing-key cache with per-keyId single-flight JWKS fetching.
pub struct SigningKeyCache {
    /// HTTP client for fetching the JWKS document.
    http_client: reqwest::Client,
    /// JWKS endpoint URL.
    jwks_url: String,
    /// Resolved keys, kept for the process lifetime.
    keys: KeyMap,
    /// Single-flight coordinator, one slot per key identifier.
    inflight: Mutex<HashMap<String, InflightFetch>>,
}

impl SigningKeyCache {
    /// Creates a cache fetching from the configured JWKS endpoint.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.jwks_fetch_timeout_secs))
            .build()
            .map_err(|e| AuthError::KeyResolution {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            jwks_url: config.jwks_url_str().to_string(),
            keys: Arc::new(RwLock::new(HashMap::new())),
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Resolves a key identifier to verification key material.
    ///
    /// A cache hit returns without any I/O. On a miss, concurrent callers
    /// for the same identifier share one outstanding fetch; fetches for
    /// different identifiers proceed in parallel.
    #[instrument(skip(self), fields(kid = %key_id))]
    pub async fn resolve(&self, key_id: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.keys.read().await.get(key_id) {
            return Ok(Arc::clone(key));
        }

        let fetch = {
            let mut inflight = self.inflight.lock().await;

            // Re-check under the coordinator lock: a fetch may have landed
            // between the read above and acquiring the lock.
            if let Some(key) = self.keys.read().await.get(key_id) {
                return Ok(Arc::clone(key));
            }

            match inflight.get(key_id) {
                Some(fetch) => fetch.clone(),
                None => {
                    let fetch = fetch_key(
                        self.http_client.clone(),
                        self.jwks_url.clone(),
                        key_id.to_string(),
                        Arc::clone(&self.keys),
                    )
                    .boxed()
                    .shared();
                    inflight.insert(key_id.to_string(), fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        // Retire the in-flight slot, but only if it still holds this fetch.
        // A failed fetch must not linger, or the key could never be retried;
        // a newer fetch started by another caller must not be clobbered.
        let mut inflight = self.inflight.lock().await;
        if let Some(current) = inflight.get(key_id) {
            if current.ptr_eq(&fetch) {
                inflight.remove(key_id);
            }
        }

        result
    }

    /// Number of cached keys.
    pub async fn key_count(&self) -> usize {
        self.keys.read().await.len()
    }
}

/// Fetches the JWKS document and caches the key named by `key_id`.
///
/// Owned values only: the future must be `'static` so that waiters which
/// abandon their request leave it drivable by the remaining waiters.
async fn fetch_key(
    client: reqwest::Client,
    url: String,
    key_id: String,
    keys: KeyMap,
) -> Result<Arc<DecodingKey>, AuthError> {
    info!(url = %url, "fetching JWKS");

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(AuthError::KeyResolution {
            reason: format!("JWKS fetch returned status {}", response.status()),
        });
    }

    let jwks: Jwks = response.json().await.map_err(|e| AuthError::KeyResolution {
        reason: format!("failed to parse JWKS document: {}", sanitize_message(&e.to_string())),
    })?;

    let jwk = jwks
        .keys
        .iter()
        .find(|k| k.matches(&key_id))
        .ok_or_else(|| AuthError::KeyResolution {
            reason: format!("key {key_id} not present in published set"),
        })?;

    let key = Arc::new(jwk_to_decoding_key(jwk)?);
    keys.write().await.insert(key_id, Arc::clone(&key));

    info!("signing key cached");
    Ok(key)
}

/// Converts a JWK to a `DecodingKey`.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match jwk.kty.as_str() {
        "RSA" => {
            let n = require_component(jwk, &jwk.n, "n")?;
            let e = require_component(jwk, &jwk.e, "e")?;

            // Minimum key size 2048 bits (256 bytes, ~342 chars base64url).
            if n.len() < 340 {
                warn!(kid = ?jwk.kid, "RSA key too small, rejecting");
                return Err(AuthError::KeyResolution {
                    reason: "RSA modulus below 2048 bits".to_string(),
                });
            }

            DecodingKey::from_rsa_components(n, e).map_err(|e| AuthError::KeyResolution {
                reason: format!("invalid RSA key material: {e}"),
            })
        }
        "EC" => {
            let x = require_component(jwk, &jwk.x, "x")?;
            let y = require_component(jwk, &jwk.y, "y")?;
            let crv = jwk.crv.as_deref().unwrap_or("P-256");

            if !matches!(crv, "P-256" | "P-384" | "P-521") {
                warn!(kid = ?jwk.kid, crv = %crv, "weak EC curve, rejecting");
                return Err(AuthError::KeyResolution {
                    reason: format!("unsupported EC curve {crv}"),
                });
            }

            DecodingKey::from_ec_components(x, y).map_err(|e| AuthError::KeyResolution {
                reason: format!("invalid EC key material: {e}"),
            })
        }
        other => Err(AuthError::KeyResolution {
            reason: format!("unsupported key type {other}"),
        }),
    }
}

fn require_component<'a>(
    jwk: &Jwk,
    component: &'a Option<String>,
    name: &str,
) -> Result<&'a str, AuthError> {
    component.as_deref().ok_or_else(|| AuthError::KeyResolution {
        reason: format!("{} key missing {name} component", jwk.kty),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rsa_jwk(n: Option<String>, e: Option<String>) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: Some("key-1".to_string()),
            x5t: None,
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n,
            e,
            x: None,
            y: None,
            crv: None,
        }
    }

    #[test]
    fn matches_on_kid_or_x5t() {
        let mut jwk = rsa_jwk(None, None);
        jwk.x5t = Some("thumb-1".to_string());
        assert!(jwk.matches("key-1"));
        assert!(jwk.matches("thumb-1"));
        assert!(!jwk.matches("other"));
    }

    #[test]
    fn rejects_unsupported_key_type() {
        let mut jwk = rsa_jwk(None, None);
        jwk.kty = "oct".to_string();
        // DecodingKey is not Debug, so match on the Result directly.
        assert!(matches!(
            jwk_to_decoding_key(&jwk),
            Err(AuthError::KeyResolution { .. })
        ));
    }

    #[test]
    fn rejects_rsa_key_missing_components() {
        let jwk = rsa_jwk(Some("x".repeat(342)), None);
        assert!(jwk_to_decoding_key(&jwk).is_err());

        let jwk = rsa_jwk(None, Some("AQAB".to_string()));
        assert!(jwk_to_decoding_key(&jwk).is_err());
    }

    #[test]
    fn rejects_small_rsa_modulus() {
        let jwk = rsa_jwk(Some("shortmodulus".to_string()), Some("AQAB".to_string()));
        assert!(matches!(
            jwk_to_decoding_key(&jwk),
            Err(AuthError::KeyResolution { .. })
        ));
    }

    #[test]
    fn rejects_weak_ec_curve() {
        let jwk = Jwk {
            kty: "EC".to_string(),
            kid: Some("key-2".to_string()),
            x5t: None,
            key_use: None,
            alg: None,
            n: None,
            e: None,
            x: Some("x-coord".to_string()),
            y: Some("y-coord".to_string()),
            crv: Some("secp256k1".to_string()),
        };
        assert!(matches!(
            jwk_to_decoding_key(&jwk),
            Err(AuthError::KeyResolution { .. })
        ));
    }
}
