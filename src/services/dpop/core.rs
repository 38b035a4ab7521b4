//! DPoP proof validation (RFC 9449) - core logic.
//!
//! This module is intentionally "core-only": it does not know about Axum
//! extractors or a replay cache. Middleware calls `validate_with_context` and
//! layers whatever else it needs on top (the returned `jti` is what a replay
//! cache would key on).

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use tracing::debug;

use super::claims::check_claims;
use super::decoder::decode_proof;
use super::key::resolve_key;
use super::signature::{DEFAULT_ALGORITHMS, SignatureVerifier};
use super::types::{
    DEFAULT_CLOCK_SKEW_SECONDS, DpopError, ProofClaims, ValidationContext, ValidationResult,
};

/// Policy knobs for the validator.
///
/// Kept separate from the app `Config` so the core stays testable and reusable.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub allowed_algorithms: Vec<Algorithm>,
    // Allowed |now - iat| drift, seconds.
    pub clock_skew_seconds: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_algorithms: DEFAULT_ALGORITHMS.to_vec(),
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
        }
    }
}

/// A successfully validated proof, plus what the pipeline learned on the way.
#[derive(Debug, Clone)]
pub struct VerifiedProof {
    pub claims: ProofClaims,
    /// RFC 7638 thumbprint of the key that signed the proof.
    pub jkt: String,
}

/// Stateless DPoP proof validator. Cheap to clone; share freely across tasks.
#[derive(Debug, Clone)]
pub struct DpopValidator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    verifier: SignatureVerifier,
    clock_skew_seconds: u64,
}

impl Default for DpopValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl DpopValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                verifier: SignatureVerifier::new(config.allowed_algorithms),
                clock_skew_seconds: config.clock_skew_seconds,
            }),
        }
    }

    pub fn allowed_algorithms(&self) -> &[Algorithm] {
        self.inner.verifier.allowed()
    }

    pub fn clock_skew_seconds(&self) -> u64 {
        self.inner.clock_skew_seconds
    }

    /// Validate `proof` for a request happening now.
    pub fn validate(
        &self,
        proof: &str,
        http_method: &str,
        request_url: &str,
        access_token: Option<&str>,
    ) -> ValidationResult {
        let ctx = self.context(http_method, request_url, access_token);
        self.validate_with_context(proof, &ctx)
    }

    /// Validate `proof` against an explicit context (time and skew included).
    pub fn validate_with_context(&self, proof: &str, ctx: &ValidationContext) -> ValidationResult {
        self.verify(proof, ctx).map(|v| v.claims).into()
    }

    /// Builds a context for "now" using this validator's configured skew.
    pub fn context(
        &self,
        http_method: &str,
        request_url: &str,
        access_token: Option<&str>,
    ) -> ValidationContext {
        ValidationContext {
            http_method: http_method.to_owned(),
            request_url: request_url.to_owned(),
            access_token: access_token.map(str::to_owned),
            current_time: Utc::now(),
            clock_skew_tolerance_seconds: self.inner.clock_skew_seconds,
        }
    }

    /// Same pipeline as `validate_with_context`, but keeps the error typed and
    /// also returns the key thumbprint.
    pub fn verify(&self, proof: &str, ctx: &ValidationContext) -> Result<VerifiedProof, DpopError> {
        let result = self.run(proof, ctx);
        if let Err(e) = &result {
            debug!(code = e.code(), error = %e, "DPoP proof rejected");
        }
        result
    }

    fn run(&self, proof: &str, ctx: &ValidationContext) -> Result<VerifiedProof, DpopError> {
        // 1) Structure: segments, typ, jwk presence.
        let token = decode_proof(proof)?;

        // 2) Embedded jwk -> public verification key.
        let key = resolve_key(&token.header.jwk)?;

        // 3) Signature, constrained to the allow-list.
        self.inner.verifier.verify(&token, &key)?;

        // 4) Claims, only now that they are signed.
        check_claims(&token.claims, ctx)?;

        Ok(VerifiedProof {
            claims: token.claims,
            jkt: key.thumbprint().to_owned(),
        })
    }
}

/// Validate with the default policy (RS256/ES256/EdDSA, 60 s skew).
pub fn validate(
    proof: &str,
    http_method: &str,
    request_url: &str,
    access_token: Option<&str>,
) -> ValidationResult {
    DpopValidator::default().validate(proof, http_method, request_url, access_token)
}
