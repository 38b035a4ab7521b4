pub mod proof_ctx;

pub use proof_ctx::{ProofCtx, ProofCtxExtractor};
