/*
 * Responsibility
 * - POST /dpop/validate
 * - 任意の proof / method / url / access_token を検証して結果をそのまま返す
 * - 検証失敗も 200 (結果は body の valid で表す)
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::dto::validate::ValidateRequest, error::AppError, services::dpop::ValidationResult,
    state::AppState,
};

pub async fn validate_proof(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidationResult>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    let result = state
        .dpop
        .validate(&req.proof, &req.method, &req.url, req.access_token.as_deref());

    if let ValidationResult::Invalid { error } = &result {
        tracing::info!(code = error.code(), "proof rejected via validate endpoint");
    }

    Ok(Json(result))
}
