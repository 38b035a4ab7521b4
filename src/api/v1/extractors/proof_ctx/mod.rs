/*!
 * DPoP proof context extractor
 *
 * Responsibility:
 * - 検証済み DPoP proof のコンテキスト（ProofCtx）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - ProofCtx
 * - ProofCtxExtractor
 */

mod core;
mod types;

pub use self::core::ProofCtxExtractor;
pub use types::ProofCtx;
