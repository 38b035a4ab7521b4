/*
 * Responsibility
 * - GET /health (疎通用)
 * - 有効な DPoP ポリシー (algs / clock skew) も返す
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "dpop": {
                "algs": state.dpop.allowed_algorithms(),
                "clock_skew_seconds": state.dpop.clock_skew_seconds(),
            }
        })),
    )
}
