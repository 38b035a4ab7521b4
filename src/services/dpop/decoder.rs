//! Structural decoding of a compact DPoP proof.
//!
//! Nothing decoded here is trusted yet: the only checks are shape, encoding
//! of header and payload, the `typ` tag and the presence of an embedded `jwk`.
//! The signature segment is passed through untouched.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};
use tracing::debug;

use super::types::{DPOP_JWT_TYPE, DpopError, ProofClaims, ProofHeader, ProofToken};

pub fn decode_proof(proof: &str) -> Result<ProofToken, DpopError> {
    let mut parts = proof.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DpopError::Decode("expected three segments".into()));
    };

    if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
        return Err(DpopError::Decode("empty segment".into()));
    }

    let header = decode_object(header_b64, "header")?;
    let payload = decode_object(payload_b64, "payload")?;

    let header = parse_header(header)?;

    let claims: ProofClaims = serde_json::from_value(Value::Object(payload)).map_err(|e| {
        debug!(error = %e, "DPoP payload has ill-typed claims");
        DpopError::Decode("payload claims have unexpected types".into())
    })?;

    Ok(ProofToken {
        header,
        claims,
        signature: signature_b64.to_owned(),
        signing_input: format!("{header_b64}.{payload_b64}"),
    })
}

fn decode_object(segment: &str, what: &'static str) -> Result<Map<String, Value>, DpopError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        debug!(error = %e, segment = what, "DPoP segment is not base64url");
        DpopError::Decode(format!("{what} is not base64url"))
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DpopError::Decode(format!("{what} is not a JSON object"))),
        Err(e) => {
            debug!(error = %e, segment = what, "DPoP segment is not JSON");
            Err(DpopError::Decode(format!("{what} is not JSON")))
        }
    }
}

fn parse_header(mut header: Map<String, Value>) -> Result<ProofHeader, DpopError> {
    // typ is compared literally (no case folding)
    let typ = match header.get("typ") {
        Some(Value::String(typ)) if typ == DPOP_JWT_TYPE => typ.clone(),
        _ => return Err(DpopError::TypeMismatch),
    };

    let alg = match header.get("alg") {
        None | Some(Value::Null) => None,
        Some(Value::String(alg)) => Some(alg.clone()),
        Some(_) => return Err(DpopError::Decode("alg is not a string".into())),
    };

    let jwk = match header.remove("jwk") {
        None | Some(Value::Null) => return Err(DpopError::MissingKeyMaterial),
        Some(jwk) => jwk,
    };

    Ok(ProofHeader { typ, alg, jwk })
}
