use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::state::AppState;

use super::ProofCtx;

/// Handler で ProofCtx を受け取るための extractor
/// middleware が ProofCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（DPoP middleware 未設定）
pub struct ProofCtxExtractor(pub ProofCtx);

impl FromRequestParts<AppState> for ProofCtxExtractor {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ProofCtx>()
            .cloned()
            .map(ProofCtxExtractor)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
