//! Signature verification restricted to an asymmetric algorithm allow-list.
//!
//! The header's `alg` only ever *selects* from the allow-list; it can never
//! widen it. `none` and the HMAC family are unreachable from here.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, crypto};
use tracing::debug;

use super::key::{KeyType, VerificationKey};
use super::types::{DpopError, ProofToken};

/// Every algorithm a verifier may be configured with.
pub const SUPPORTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

pub const DEFAULT_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256, Algorithm::ES256, Algorithm::EdDSA];

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    allowed: Vec<Algorithm>,
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALGORITHMS.to_vec(),
        }
    }
}

impl SignatureVerifier {
    /// Build a verifier from a configured allow-list.
    ///
    /// Anything outside [`SUPPORTED_ALGORITHMS`] is dropped, so a
    /// misconfiguration can narrow the list but never admit a symmetric
    /// algorithm.
    pub fn new(allowed: impl IntoIterator<Item = Algorithm>) -> Self {
        let mut list = Vec::new();
        for alg in allowed {
            if SUPPORTED_ALGORITHMS.contains(&alg) && !list.contains(&alg) {
                list.push(alg);
            }
        }
        Self { allowed: list }
    }

    pub fn allowed(&self) -> &[Algorithm] {
        &self.allowed
    }

    pub fn verify(&self, proof: &ProofToken, key: &VerificationKey) -> Result<(), DpopError> {
        let alg = self.select_algorithm(proof.header.alg.as_deref())?;

        if !key_fits(key.key_type, alg) {
            return Err(DpopError::SignatureInvalid(format!(
                "{alg:?} cannot be used with a {:?} key",
                key.key_type
            )));
        }

        // Only the JWS signature is checked here. A proof is not an access
        // token, so exp/nbf/aud never apply and iat belongs to the claims stage.
        match crypto::verify(
            &proof.signature,
            proof.signing_input.as_bytes(),
            &key.decoding_key,
            alg,
        ) {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(alg = ?alg, "DPoP signature does not verify");
                Err(DpopError::SignatureInvalid("signature does not verify".into()))
            }
            Err(e) => {
                debug!(error = ?e, alg = ?alg, "DPoP signature is malformed");
                Err(DpopError::SignatureInvalid("malformed signature".into()))
            }
        }
    }

    fn select_algorithm(&self, header_alg: Option<&str>) -> Result<Algorithm, DpopError> {
        let name = header_alg.ok_or_else(|| DpopError::SignatureInvalid("missing alg".into()))?;
        let alg = Algorithm::from_str(name)
            .map_err(|_| DpopError::SignatureInvalid(format!("unsupported alg {name}")))?;
        if !self.allowed.contains(&alg) {
            return Err(DpopError::SignatureInvalid(format!("alg {name} is not allowed")));
        }
        Ok(alg)
    }
}

fn key_fits(key_type: KeyType, alg: Algorithm) -> bool {
    match key_type {
        KeyType::Rsa => matches!(
            alg,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        KeyType::EcP256 => alg == Algorithm::ES256,
        KeyType::EcP384 => alg == Algorithm::ES384,
        KeyType::Ed25519 => alg == Algorithm::EdDSA,
    }
}
