//! Fixed keys and proof builders shared by the dpop unit tests.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Map, Value, json};

use super::types::DPOP_JWT_TYPE;

const ED25519_PEM: &str = include_str!("../../../tests/fixtures/ed25519.pem");
const P256_PEM: &str = include_str!("../../../tests/fixtures/p256.pem");
const RSA_PEM: &str = include_str!("../../../tests/fixtures/rsa2048.pem");

pub const NOW: i64 = 1_760_000_000;
pub const URL: &str = "https://api.example.com/orders";

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap()
}

pub fn ed25519_public_jwk() -> Value {
    json!({"kty": "OKP", "crv": "Ed25519", "x": "9CbPiGxnWoN-eh79ROgt_EL-Dm_93ffGmw-hTUJxXZk"})
}

pub fn ec_public_jwk() -> Value {
    json!({
        "kty": "EC",
        "crv": "P-256",
        "x": "8BBljyiBrytTEJAHcq81ES5NdV9S1662NFZug1efltk",
        "y": "-EglRTaLQAfwoFKEFXI9sSv06Ue9yDdxN1MJBm9mHFc"
    })
}

pub fn rsa_public_jwk() -> Value {
    json!({
        "kty": "RSA",
        "n": "pE4yRD5SnDadJa41LHNfrVpx5wFV7o5HPv53T-X1gt7pJhXBYdsCBRT9FFmW16rA8AQzk9Nf_WdGimxGDUU6C2AFxVb_1kDc9lkAZJYY8DA1ed5XSdvxOWhhfaCmMlrVFqJ9K8TiN8s0eNHXz7Vajx0uFYNsrw9SBZC78AuxTxsvRYWZnJXt7ADuSE8pryNgpP-ZfpE9ivA_TeGmApzy8IoGEovvs1BvnFFU4Q45uxP0jj03mIkkICWjm6aL6tmdXXFpEwDnIQ24XkgUBhHBN-dXf5aHZoSfyzH9LT6WLTTaS_7hB3LEhlloWaToEJz5hDXYfWm0pIpfQmXqn4CztQ",
        "e": "AQAB"
    })
}

#[derive(Debug, Clone, Copy)]
pub enum TestKey {
    Ed25519,
    P256,
    Rsa,
}

impl TestKey {
    pub const ALL: [TestKey; 3] = [TestKey::Ed25519, TestKey::P256, TestKey::Rsa];

    pub fn algorithm(self) -> Algorithm {
        match self {
            Self::Ed25519 => Algorithm::EdDSA,
            Self::P256 => Algorithm::ES256,
            Self::Rsa => Algorithm::RS256,
        }
    }

    pub fn public_jwk(self) -> Value {
        match self {
            Self::Ed25519 => ed25519_public_jwk(),
            Self::P256 => ec_public_jwk(),
            Self::Rsa => rsa_public_jwk(),
        }
    }

    fn encoding_key(self) -> EncodingKey {
        match self {
            Self::Ed25519 => EncodingKey::from_ed_pem(ED25519_PEM.as_bytes()).unwrap(),
            Self::P256 => EncodingKey::from_ec_pem(P256_PEM.as_bytes()).unwrap(),
            Self::Rsa => EncodingKey::from_rsa_pem(RSA_PEM.as_bytes()).unwrap(),
        }
    }
}

/// Claims for a POST to [`URL`] issued at `iat`.
pub fn claims_at(iat: i64) -> Value {
    json!({
        "jti": "e1j3V_bKic8-LAEB",
        "htm": "POST",
        "htu": URL,
        "iat": iat
    })
}

pub fn sign_proof(key: TestKey, claims: &Value) -> String {
    let mut header = Header::new(key.algorithm());
    header.typ = Some(DPOP_JWT_TYPE.to_string());
    header.jwk = Some(serde_json::from_value(key.public_jwk()).unwrap());
    jsonwebtoken::encode(&header, claims, &key.encoding_key()).unwrap()
}

/// A correctly MACed HS256 proof that embeds a public EC jwk.
pub fn sign_hs256_proof(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some(DPOP_JWT_TYPE.to_string());
    header.jwk = Some(serde_json::from_value(ec_public_jwk()).unwrap());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(b"shared secret")).unwrap()
}

/// Rewrites the header segment of `token`, keeping payload and signature.
pub fn with_header(token: &str, edit: impl FnOnce(&mut Map<String, Value>)) -> String {
    let (header, rest) = token.split_once('.').unwrap();
    let mut header: Map<String, Value> =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header).unwrap()).unwrap();
    edit(&mut header);
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
    format!("{header}.{rest}")
}

/// Rewrites the payload segment of `token`, keeping header and signature.
pub fn with_payload(token: &str, payload: &Value) -> String {
    let mut parts = token.split('.');
    let (header, _, signature) = (
        parts.next().unwrap(),
        parts.next().unwrap(),
        parts.next().unwrap(),
    );
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("{header}.{payload}.{signature}")
}
