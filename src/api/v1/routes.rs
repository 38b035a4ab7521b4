/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /dpop/validate は公開、/proof は DPoP middleware の内側
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{health::health, proof::show_proof, validate::validate_proof};
use crate::middleware::dpop_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/proof", get(show_proof).post(show_proof));
    let protected = dpop_auth::apply(protected, state);

    Router::new()
        .route("/health", get(health))
        .route("/dpop/validate", post(validate_proof))
        .merge(protected)
}
