/*
 * Responsibility
 * - Handler から見える「検証済み DPoP proof」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 */
use serde::Serialize;

use crate::services::dpop::VerifiedProof;

/// 検証済みリクエストに付与されるコンテキスト
///
/// - `jti` は replay cache を外側に積む場合のキー
/// - `jkt` は proof を署名した鍵の thumbprint (access token の cnf.jkt と突き合わせる用)
/// - `ath_bound` は proof が access token に bind されていたか
#[derive(Debug, Clone, Serialize)]
pub struct ProofCtx {
    pub jti: String,
    pub htm: String,
    pub htu: String,
    pub iat: serde_json::Number,
    pub jkt: String,
    pub ath_bound: bool,
}

impl From<VerifiedProof> for ProofCtx {
    fn from(v: VerifiedProof) -> Self {
        // required claims are guaranteed present once verification succeeded
        Self {
            jti: v.claims.jti.unwrap_or_default(),
            htm: v.claims.htm.unwrap_or_default(),
            htu: v.claims.htu.unwrap_or_default(),
            iat: v.claims.iat.unwrap_or_else(|| 0.into()),
            jkt: v.jkt,
            ath_bound: v.claims.ath.is_some(),
        }
    }
}
