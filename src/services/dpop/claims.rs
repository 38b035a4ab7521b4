//! Claim checks, run only after the signature has been verified.
//!
//! Order is fixed and the first failure wins:
//! jti, htm, htu, iat presence → htm → htu → iat window → ath.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Number;
use sha2::{Digest, Sha256};

use super::types::{DpopError, ProofClaims, ValidationContext};

pub fn check_claims(claims: &ProofClaims, ctx: &ValidationContext) -> Result<(), DpopError> {
    // 1) Required claims.
    let _jti = required(claims.jti.as_deref(), "jti")?;
    let htm = required(claims.htm.as_deref(), "htm")?;
    let htu = required(claims.htu.as_deref(), "htu")?;
    let iat = claims.iat.as_ref().ok_or(DpopError::MissingClaim("iat"))?;

    // 2) htm check (case-sensitive)
    if htm != ctx.http_method {
        return Err(DpopError::MethodMismatch);
    }

    // 3) htu check
    if htu != normalize_request_url(&ctx.request_url) {
        return Err(DpopError::UrlMismatch);
    }

    // 4) iat window check (inclusive on both sides)
    let now = ctx.current_time.timestamp();
    if !within_window(iat, now, ctx.clock_skew_tolerance_seconds) {
        return Err(DpopError::TimestampOutOfWindow);
    }

    // 5) ath check, only when both sides are present and non-empty
    if let Some(access_token) = ctx.access_token.as_deref().filter(|t| !t.is_empty())
        && let Some(ath) = claims.ath.as_deref().filter(|a| !a.is_empty())
        && compute_ath(access_token) != ath
    {
        return Err(DpopError::AccessTokenHashMismatch);
    }

    Ok(())
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, DpopError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DpopError::MissingClaim(name)),
    }
}

// iat is a NumericDate: integral values take the exact path, anything else
// (fractions, values past i64) is compared as f64.
fn within_window(iat: &Number, now: i64, skew: u64) -> bool {
    match iat.as_i64() {
        Some(iat) => now.abs_diff(iat) <= skew,
        None => iat
            .as_f64()
            .is_some_and(|iat| (now as f64 - iat).abs() <= skew as f64),
    }
}

/// Strip query string and fragment. No other canonicalization is applied.
pub fn normalize_request_url(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// `ath` value for an access token: base64url(SHA-256(token)) without padding.
pub fn compute_ath(access_token: &str) -> String {
    let digest = Sha256::digest(access_token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
