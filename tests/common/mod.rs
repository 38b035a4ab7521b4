//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use axum::{Router, body::Body, http::Response};
use chrono::Utc;
use dpop_validator::{
    app::{build_router, build_state},
    config::Config,
};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

const ED25519_PEM: &str = include_str!("../fixtures/ed25519.pem");

pub const HOST: &str = "localhost:3000";

/// Router built from defaults plus the given env overrides.
pub fn app_with(vars: &[(&str, &str)]) -> Router {
    let config = Config::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();
    build_router(build_state(&config), config.request_timeout)
}

pub fn app() -> Router {
    app_with(&[])
}

pub fn client_jwk() -> Value {
    json!({"kty": "OKP", "crv": "Ed25519", "x": "9CbPiGxnWoN-eh79ROgt_EL-Dm_93ffGmw-hTUJxXZk"})
}

/// EdDSA proof for `method url`, issued now, optionally bound to an access token hash.
pub fn proof(method: &str, url: &str, ath: Option<&str>) -> String {
    let mut claims = json!({
        "jti": uuid::Uuid::new_v4().to_string(),
        "htm": method,
        "htu": url,
        "iat": Utc::now().timestamp(),
    });
    if let Some(ath) = ath {
        claims["ath"] = json!(ath);
    }

    let mut header = Header::new(Algorithm::EdDSA);
    header.typ = Some("dpop+jwt".to_string());
    header.jwk = Some(serde_json::from_value(client_jwk()).unwrap());
    let key = EncodingKey::from_ed_pem(ED25519_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, &claims, &key).unwrap()
}

pub async fn json_body(res: Response<Body>) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
