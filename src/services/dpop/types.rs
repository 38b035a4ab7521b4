/*
 * Responsibility
 * - DPoP proof の型 (header / claims / parsed token)
 * - 呼び出し側が渡す ValidationContext
 * - パイプラインの結果型 ValidationResult とエラー分類 DpopError
 */
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// `typ` header value every DPoP proof must carry.
pub const DPOP_JWT_TYPE: &str = "dpop+jwt";

/// Default allowed |now - iat| drift, seconds.
pub const DEFAULT_CLOCK_SKEW_SECONDS: u64 = 60;

/// DPoP proof JWT header (RFC 9449).
///
/// `alg` stays a raw string here: mapping it onto a verification algorithm is
/// the signature stage's job, never the decoder's.
#[derive(Debug, Clone)]
pub struct ProofHeader {
    pub typ: String,
    pub alg: Option<String>,
    pub jwk: serde_json::Value,
}

/// DPoP proof JWT claims.
///
/// Required claims are still `Option` at this layer so that a missing claim is
/// reported by the claims stage (after the signature check) instead of failing
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofClaims {
    // unique proof identifier (replay detection is the caller's concern)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    // HTTP method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub htm: Option<String>,
    // HTTP URI without query and fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub htu: Option<String>,
    // issued-at, a NumericDate (seconds since epoch, fractions allowed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<serde_json::Number>,
    // base64url(SHA-256(access_token))
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ath: Option<String>,
    // Anything else the client put in the payload (nonce, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A structurally decoded (but not yet trusted) DPoP proof.
#[derive(Debug, Clone)]
pub struct ProofToken {
    pub header: ProofHeader,
    pub claims: ProofClaims,
    /// Signature segment as received (base64url); interpreting it is the verifier's job.
    pub signature: String,
    /// `base64url(header) "." base64url(payload)`
    pub signing_input: String,
}

/// Caller-supplied request context a proof is checked against.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub http_method: String,
    /// Full request URL as observed; query and fragment are stripped before comparison.
    pub request_url: String,
    pub access_token: Option<String>,
    pub current_time: DateTime<Utc>,
    pub clock_skew_tolerance_seconds: u64,
}

impl ValidationContext {
    pub fn new(http_method: impl Into<String>, request_url: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            request_url: request_url.into(),
            access_token: None,
            current_time: Utc::now(),
            clock_skew_tolerance_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn at(mut self, current_time: DateTime<Utc>) -> Self {
        self.current_time = current_time;
        self
    }

    pub fn with_clock_skew(mut self, seconds: u64) -> Self {
        self.clock_skew_tolerance_seconds = seconds;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DpopError {
    #[error("malformed DPoP proof: {0}")]
    Decode(String),
    #[error("invalid DPoP typ")]
    TypeMismatch,
    #[error("missing jwk in DPoP header")]
    MissingKeyMaterial,
    #[error("unusable DPoP jwk: {0}")]
    KeyConversion(String),
    #[error("invalid DPoP signature: {0}")]
    SignatureInvalid(String),
    #[error("missing required claim: {0}")]
    MissingClaim(&'static str),
    #[error("htm mismatch")]
    MethodMismatch,
    #[error("htu mismatch")]
    UrlMismatch,
    #[error("iat outside the allowed window")]
    TimestampOutOfWindow,
    #[error("ath mismatch")]
    AccessTokenHashMismatch,
}

impl DpopError {
    /// Short, stable identifier for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::TypeMismatch => "type_mismatch",
            Self::MissingKeyMaterial => "missing_key_material",
            Self::KeyConversion(_) => "key_conversion_error",
            Self::SignatureInvalid(_) => "signature_invalid",
            Self::MissingClaim(_) => "missing_claim",
            Self::MethodMismatch => "method_mismatch",
            Self::UrlMismatch => "url_mismatch",
            Self::TimestampOutOfWindow => "timestamp_out_of_window",
            Self::AccessTokenHashMismatch => "access_token_hash_mismatch",
        }
    }
}

/// Outcome of a single validation. Exactly one variant per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid { payload: ProofClaims },
    Invalid { error: DpopError },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn payload(&self) -> Option<&ProofClaims> {
        match self {
            Self::Valid { payload } => Some(payload),
            Self::Invalid { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DpopError> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { error } => Some(error),
        }
    }
}

impl From<Result<ProofClaims, DpopError>> for ValidationResult {
    fn from(res: Result<ProofClaims, DpopError>) -> Self {
        match res {
            Ok(payload) => Self::Valid { payload },
            Err(error) => Self::Invalid { error },
        }
    }
}

// {"valid":true,"payload":{..}} / {"valid":false,"error":"<code>","message":".."}
impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Valid { payload } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("valid", &true)?;
                map.serialize_entry("payload", payload)?;
                map.end()
            }
            Self::Invalid { error } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("error", error.code())?;
                map.serialize_entry("message", &error.to_string())?;
                map.end()
            }
        }
    }
}
