/*
 * Responsibility
 * - GET|POST /proof (DPoP middleware の内側)
 * - middleware が検証・格納した ProofCtx をそのまま返す
 */
use axum::Json;

use crate::api::v1::extractors::{ProofCtx, ProofCtxExtractor};

pub async fn show_proof(ProofCtxExtractor(ctx): ProofCtxExtractor) -> Json<ProofCtx> {
    Json(ctx)
}
