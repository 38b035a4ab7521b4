mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use dpop_validator::services::dpop::compute_ath;
use serde_json::json;
use tower::ServiceExt;

use common::{HOST, app, app_with, json_body, proof};

const PROOF_URL: &str = "http://localhost:3000/api/v1/proof";

fn validate_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/dpop/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_policy() {
    let res = app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body = json_body(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dpop"]["algs"], json!(["RS256", "ES256", "EdDSA"]));
    assert_eq!(body["dpop"]["clock_skew_seconds"], 60);
}

#[tokio::test]
async fn validate_endpoint_accepts_good_proof() {
    let url = "https://api.example.com/orders";
    let res = app()
        .oneshot(validate_request(json!({
            "proof": proof("POST", url, None),
            "method": "POST",
            "url": format!("{url}?page=2"),
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["payload"]["htm"], "POST");
    assert_eq!(body["payload"]["htu"], url);
}

#[tokio::test]
async fn validate_endpoint_reports_failures_in_body() {
    let url = "https://api.example.com/orders";
    let res = app()
        .oneshot(validate_request(json!({
            "proof": proof("POST", url, None),
            "method": "GET",
            "url": url,
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "method_mismatch");
    assert!(body.get("payload").is_none());

    let res = app()
        .oneshot(validate_request(json!({
            "proof": "not-a-jwt",
            "method": "GET",
            "url": url,
        })))
        .await
        .unwrap();
    assert_eq!(json_body(res).await["error"], "decode_error");
}

#[tokio::test]
async fn validate_endpoint_checks_access_token_binding() {
    let url = "https://api.example.com/orders";
    let proof = proof("POST", url, Some(&compute_ath("token-a")));

    for (token, valid) in [("token-a", true), ("token-b", false)] {
        let res = app()
            .oneshot(validate_request(json!({
                "proof": proof,
                "method": "POST",
                "url": url,
                "access_token": token,
            })))
            .await
            .unwrap();
        assert_eq!(json_body(res).await["valid"], valid, "{token}");
    }
}

#[tokio::test]
async fn validate_endpoint_rejects_empty_method() {
    let res = app()
        .oneshot(validate_request(json!({
            "proof": "a.b.c",
            "method": "",
            "url": "https://api.example.com/",
        })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn protected_route_requires_proof_header() {
    let res = app()
        .oneshot(
            Request::get("/api/v1/proof")
                .header(header::HOST, HOST)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "DPoP");
    assert_eq!(json_body(res).await["error"]["code"], "missing_dpop_proof");
}

#[tokio::test]
async fn protected_route_echoes_verified_proof() {
    let res = app()
        .oneshot(
            Request::get("/api/v1/proof?debug=1")
                .header(header::HOST, HOST)
                .header("dpop", proof("GET", PROOF_URL, None))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["htm"], "GET");
    assert_eq!(body["htu"], PROOF_URL);
    assert_eq!(body["ath_bound"], false);
    assert_eq!(body["jkt"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn protected_route_rejects_wrong_method() {
    let res = app()
        .oneshot(
            Request::post("/api/v1/proof")
                .header(header::HOST, HOST)
                .header("dpop", proof("GET", PROOF_URL, None))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers()[header::WWW_AUTHENTICATE],
        r#"DPoP error="invalid_dpop_proof""#
    );
    assert_eq!(json_body(res).await["error"]["code"], "method_mismatch");
}

#[tokio::test]
async fn protected_route_binds_dpop_access_token() {
    let proof = proof("GET", PROOF_URL, Some(&compute_ath("token-a")));

    let res = app()
        .oneshot(
            Request::get("/api/v1/proof")
                .header(header::HOST, HOST)
                .header(header::AUTHORIZATION, "DPoP token-a")
                .header("dpop", proof.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["ath_bound"], true);

    let res = app()
        .oneshot(
            Request::get("/api/v1/proof")
                .header(header::HOST, HOST)
                .header(header::AUTHORIZATION, "DPoP token-b")
                .header("dpop", proof)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(res).await["error"]["code"],
        "access_token_hash_mismatch"
    );
}

#[tokio::test]
async fn public_base_url_overrides_host() {
    let app = app_with(&[("PUBLIC_BASE_URL", "https://api.example.com/")]);
    let res = app
        .oneshot(
            Request::get("/api/v1/proof")
                .header(header::HOST, "internal:8080")
                .header("dpop", proof("GET", "https://api.example.com/api/v1/proof", None))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn configured_algorithms_are_enforced() {
    let app = app_with(&[("DPOP_ALLOWED_ALGS", "ES256")]);
    let res = app
        .oneshot(
            Request::get("/api/v1/proof")
                .header(header::HOST, HOST)
                .header("dpop", proof("GET", PROOF_URL, None))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["error"]["code"], "signature_invalid");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let body = "x".repeat(dpop_validator::middleware::http::BODY_LIMIT_BYTES + 1);
    let res = app()
        .oneshot(
            Request::post("/api/v1/dpop/validate")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let res = app()
        .oneshot(
            Request::get("/api/v1/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn validate_endpoint_reports_malformed_signature_as_signature_failure() {
    let url = "https://api.example.com/orders";
    let proof = proof("POST", url, None);
    let (signing_input, _) = proof.rsplit_once('.').unwrap();
    let res = app()
        .oneshot(validate_request(json!({
            "proof": format!("{signing_input}.***"),
            "method": "POST",
            "url": url,
        })))
        .await
        .unwrap();

    assert_eq!(json_body(res).await["error"], "signature_invalid");
}
