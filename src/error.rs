/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - DPoP error を統一的に変換 (401 + WWW-Authenticate)
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::dpop::DpopError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("missing or duplicated DPoP header")]
    MissingDpopProof,
    #[error("invalid DPoP proof: {0}")]
    InvalidDpopProof(#[from] DpopError),
    #[error("request timed out")]
    RequestTimeout,
    #[error("internal error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone())
            }
            AppError::MissingDpopProof => (
                StatusCode::UNAUTHORIZED,
                "missing_dpop_proof",
                "exactly one DPoP header is required".into(),
            ),
            AppError::InvalidDpopProof(e) => (StatusCode::UNAUTHORIZED, e.code(), e.to_string()),
            AppError::RequestTimeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                "request timed out".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "internal error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut res = (status, Json(body)).into_response();
        // RFC 9449 section 7.1
        let challenge = match self {
            AppError::MissingDpopProof => Some("DPoP"),
            AppError::InvalidDpopProof(_) => Some(r#"DPoP error="invalid_dpop_proof""#),
            _ => None,
        };
        if let Some(challenge) = challenge {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpop_errors_become_401_with_challenge() {
        let res = AppError::from(DpopError::MethodMismatch).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            r#"DPoP error="invalid_dpop_proof""#
        );
    }

    #[test]
    fn missing_proof_gets_bare_challenge() {
        let res = AppError::MissingDpopProof.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "DPoP");
    }

    #[test]
    fn layer_errors_use_the_json_body() {
        let res = AppError::RequestTimeout.into_response();
        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(res.headers().get(header::WWW_AUTHENTICATE).is_none());
        assert_eq!(
            AppError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_has_no_challenge() {
        let res = AppError::bad_request("INVALID_BODY", "nope").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
