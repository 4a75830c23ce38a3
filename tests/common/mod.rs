//! Shared infrastructure for integration tests: RSA keypair minting,
//! token signing, and a wiremock-backed JWKS endpoint.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use jwt_gate::{AuthConfig, AuthGate};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Audience every test token carries unless a test says otherwise.
pub const AUDIENCE: &str = "urn:uuid:cafccaa2-0996-4ba4-b241-1a2c195c6d71";
/// Issuer every test token carries unless a test says otherwise.
pub const ISSUER: &str = "https://idp.example.test/services/trust";
/// Path the mock JWKS document is served under.
pub const JWKS_PATH: &str = "/discovery/keys";

/// A freshly minted RSA signing key with its public JWK form.
pub struct TestKey {
    pub kid: String,
    pub encoding_key: EncodingKey,
    pub jwk: serde_json::Value,
}

impl TestKey {
    /// Generate a 2048-bit RSA keypair identified by `kid`.
    pub fn generate(kid: &str) -> Self {
        use rsa::pkcs8::{EncodePrivateKey, LineEnding};
        use rsa::traits::PublicKeyParts;
        use rsa::RsaPrivateKey;

        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA keygen failed");
        let pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("PEM encoding failed");
        let encoding_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).expect("invalid generated key");

        let public_key = private_key.to_public_key();
        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        let jwk = json!({
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "alg": "RS256",
            "n": n,
            "e": e,
        });

        Self {
            kid: kid.to_string(),
            encoding_key,
            jwk,
        }
    }

    /// JWK form keyed by `x5t` instead of `kid`, as legacy IdPs publish.
    pub fn jwk_with_x5t(&self, thumbprint: &str) -> serde_json::Value {
        let mut jwk = self.jwk.clone();
        let obj = jwk.as_object_mut().expect("jwk is an object");
        obj.remove("kid");
        obj.insert("x5t".to_string(), json!(thumbprint));
        jwk
    }

    /// Sign `claims` as an RS256 compact token with this key's `kid`.
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &self.encoding_key).expect("token signing failed")
    }

    /// Sign with an `x5t` header and no `kid`.
    pub fn sign_with_x5t(&self, claims: &serde_json::Value, thumbprint: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(thumbprint.to_string());
        encode(&header, claims, &self.encoding_key).expect("token signing failed")
    }
}

/// Well-formed claims for `cn`/`upn` with an expiry offset in seconds.
pub fn claims_for(cn: &str, upn: &str, exp_offset_secs: i64) -> serde_json::Value {
    json!({
        "aud": AUDIENCE,
        "iss": ISSUER,
        "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
        "cn": cn,
        "upn": upn,
    })
}

/// Mount the JWKS document, asserting it is fetched exactly
/// `expected_fetches` times over the test.
pub async fn mount_jwks(server: &MockServer, keys: &[serde_json::Value], expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

/// Gate configuration pointing at the mock JWKS endpoint.
pub fn config_for(server: &MockServer, exclude_paths: &str) -> AuthConfig {
    let jwks_url =
        Url::parse(&format!("{}{JWKS_PATH}", server.uri())).expect("mock server URI is a URL");
    AuthConfig::new(jwks_url, AUDIENCE, ISSUER)
        .expect("test config is valid")
        .with_exclude_paths(exclude_paths)
        .with_jwks_fetch_timeout(5)
}

/// Gate wired to the mock JWKS endpoint.
pub fn gate_for(server: &MockServer, exclude_paths: &str) -> AuthGate {
    AuthGate::new(config_for(server, exclude_paths)).expect("gate construction failed")
}
