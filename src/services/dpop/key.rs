//! Embedded JWK → verification key.
//!
//! The proof carries its own key, so the jwk is checked member by member
//! against a public-key allow-list before anything is materialized.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::Jwk;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::types::DpopError;

// Members that only ever appear in private or symmetric keys.
const PRIVATE_MEMBERS: &[&str] = &["d", "p", "q", "dp", "dq", "qi", "oth", "k"];

// Public metadata members accepted for every key type (RFC 7517 section 4).
const METADATA_MEMBERS: &[&str] = &["alg", "kid", "use", "key_ops", "x5u", "x5c", "x5t", "x5t#S256"];

const MIN_RSA_MODULUS_BYTES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    EcP256,
    EcP384,
    Ed25519,
}

impl KeyType {
    fn from_jwk(jwk: &Map<String, Value>) -> Result<Self, DpopError> {
        let kty = str_member(jwk, "kty")?;
        match kty {
            "RSA" => Ok(Self::Rsa),
            "EC" => match str_member(jwk, "crv")? {
                "P-256" => Ok(Self::EcP256),
                "P-384" => Ok(Self::EcP384),
                other => Err(conversion(format!("unsupported EC curve {other}"))),
            },
            "OKP" => match str_member(jwk, "crv")? {
                "Ed25519" => Ok(Self::Ed25519),
                other => Err(conversion(format!("unsupported OKP curve {other}"))),
            },
            other => Err(conversion(format!("unsupported kty {other}"))),
        }
    }

    fn key_members(self) -> &'static [&'static str] {
        match self {
            Self::Rsa => &["kty", "n", "e"],
            Self::EcP256 | Self::EcP384 => &["kty", "crv", "x", "y"],
            Self::Ed25519 => &["kty", "crv", "x"],
        }
    }
}

/// A public key recovered from the proof header.
#[derive(Clone)]
pub struct VerificationKey {
    pub key_type: KeyType,
    pub decoding_key: DecodingKey,
    thumbprint: String,
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("key_type", &self.key_type)
            .field("thumbprint", &self.thumbprint)
            .finish()
    }
}

impl VerificationKey {
    /// RFC 7638 JWK thumbprint (base64url SHA-256) of the embedded key.
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }
}

pub fn resolve_key(jwk: &Value) -> Result<VerificationKey, DpopError> {
    let members = jwk
        .as_object()
        .ok_or_else(|| conversion("jwk is not a JSON object"))?;

    if let Some(private) = PRIVATE_MEMBERS.iter().find(|m| members.contains_key(**m)) {
        debug!(member = private, "DPoP jwk carries private key material");
        return Err(conversion(format!("private key member {private} in jwk")));
    }

    let key_type = KeyType::from_jwk(members)?;
    let allowed = key_type.key_members();
    if let Some(unknown) = members
        .keys()
        .find(|k| !allowed.contains(&k.as_str()) && !METADATA_MEMBERS.contains(&k.as_str()))
    {
        return Err(conversion(format!("unexpected jwk member {unknown}")));
    }

    check_lengths(key_type, members)?;

    let parsed: Jwk = serde_json::from_value(jwk.clone()).map_err(|e| {
        debug!(error = %e, "DPoP jwk rejected by parser");
        conversion("malformed jwk")
    })?;
    let decoding_key = DecodingKey::from_jwk(&parsed).map_err(|e| {
        debug!(error = ?e, "DPoP jwk could not be converted");
        conversion("jwk cannot be converted to a verification key")
    })?;

    Ok(VerificationKey {
        key_type,
        decoding_key,
        thumbprint: thumbprint(key_type, members)?,
    })
}

fn check_lengths(key_type: KeyType, jwk: &Map<String, Value>) -> Result<(), DpopError> {
    match key_type {
        KeyType::Rsa => {
            let n = decode_member(jwk, "n")?;
            // leading zero octets do not count towards the modulus size
            let significant = n.iter().skip_while(|b| **b == 0).count();
            if significant < MIN_RSA_MODULUS_BYTES {
                return Err(conversion("RSA modulus shorter than 2048 bits"));
            }
            if decode_member(jwk, "e")?.is_empty() {
                return Err(conversion("empty RSA exponent"));
            }
        }
        KeyType::EcP256 | KeyType::EcP384 => {
            let len = if key_type == KeyType::EcP256 { 32 } else { 48 };
            for coord in ["x", "y"] {
                if decode_member(jwk, coord)?.len() != len {
                    return Err(conversion(format!("{coord} has the wrong length for the curve")));
                }
            }
        }
        KeyType::Ed25519 => {
            if decode_member(jwk, "x")?.len() != 32 {
                return Err(conversion("x has the wrong length for Ed25519"));
            }
        }
    }
    Ok(())
}

// Canonical JSON: required members only, lexicographic order, no whitespace.
fn thumbprint(key_type: KeyType, jwk: &Map<String, Value>) -> Result<String, DpopError> {
    let canonical = match key_type {
        KeyType::Rsa => format!(
            r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
            str_member(jwk, "e")?,
            str_member(jwk, "n")?
        ),
        KeyType::EcP256 | KeyType::EcP384 => format!(
            r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
            str_member(jwk, "crv")?,
            str_member(jwk, "x")?,
            str_member(jwk, "y")?
        ),
        KeyType::Ed25519 => format!(
            r#"{{"crv":"Ed25519","kty":"OKP","x":"{}"}}"#,
            str_member(jwk, "x")?
        ),
    };
    Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes())))
}

fn str_member<'a>(jwk: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, DpopError> {
    jwk.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| conversion(format!("missing or non-string jwk member {name}")))
}

fn decode_member(jwk: &Map<String, Value>, name: &'static str) -> Result<Vec<u8>, DpopError> {
    URL_SAFE_NO_PAD
        .decode(str_member(jwk, name)?)
        .map_err(|_| conversion(format!("jwk member {name} is not base64url")))
}

fn conversion(reason: impl Into<String>) -> DpopError {
    DpopError::KeyConversion(reason.into())
}
