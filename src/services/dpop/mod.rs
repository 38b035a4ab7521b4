/*
 * Responsibility
 * - DPoP proof 検証パイプラインの公開面
 *   decoder → key → signature → claims の順に fail-fast で評価する
 * - 外部 (middleware / handlers) に公開する型・関数を制御する
 */
pub mod claims;
pub mod core;
pub mod decoder;
pub mod key;
pub mod signature;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::core::{DpopValidator, ValidatorConfig, VerifiedProof, validate};
pub use claims::compute_ath;
pub use signature::{DEFAULT_ALGORITHMS, SUPPORTED_ALGORITHMS};
pub use types::*;
