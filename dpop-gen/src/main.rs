use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::{Parser, ValueEnum};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a DPoP proof JWT for exercising the validator by hand.
///
/// - Ed25519 keys sign with EdDSA, P-256 keys with ES256
/// - Header: typ=dpop+jwt, alg, jwk (public members only)
/// - Claims: jti, htm, htu, iat, plus ath when an access token is given
/// - Prints the proof, the key thumbprint (jkt) and the claims used
#[derive(Parser, Debug)]
#[command(name = "dpop-gen", version, about)]
struct Args {
    /// HTTP method (htm), sent as given
    #[arg(long, default_value = "GET")]
    method: String,

    /// Full request URL used as htu (e.g. http://localhost:3000/api/v1/proof)
    #[arg(long)]
    url: String,

    /// Client private key in PKCS#8 PEM
    #[arg(long, value_name = "FILE")]
    key: PathBuf,

    /// Curve of the private key
    #[arg(long, value_enum, default_value_t = KeyKind::Ed25519)]
    key_type: KeyKind,

    /// Access token to bind via ath
    #[arg(long)]
    access_token: Option<String>,

    /// Override iat (unix seconds). Default: now.
    #[arg(long, allow_negative_numbers = true)]
    iat: Option<i64>,

    /// Override jti. Default: random UUID v4.
    #[arg(long)]
    jti: Option<String>,

    /// Print only the proof
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeyKind {
    Ed25519,
    P256,
}

enum SigningKey {
    Ed25519(ed25519_dalek::SigningKey),
    P256(p256::ecdsa::SigningKey),
}

impl SigningKey {
    fn from_pem(kind: KeyKind, pem: &str) -> Result<Self> {
        match kind {
            KeyKind::Ed25519 => {
                use ed25519_dalek::pkcs8::DecodePrivateKey;
                let key = ed25519_dalek::SigningKey::from_pkcs8_pem(pem)
                    .map_err(|e| anyhow!("invalid Ed25519 PKCS#8 key: {e}"))?;
                Ok(Self::Ed25519(key))
            }
            KeyKind::P256 => {
                use p256::pkcs8::DecodePrivateKey;
                let key = p256::ecdsa::SigningKey::from_pkcs8_pem(pem)
                    .map_err(|e| anyhow!("invalid P-256 PKCS#8 key: {e}"))?;
                Ok(Self::P256(key))
            }
        }
    }

    fn alg(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "EdDSA",
            Self::P256(_) => "ES256",
        }
    }

    /// Public JWK with members in RFC 7638 order, so its compact form is the thumbprint input.
    fn public_jwk(&self) -> Result<Value> {
        match self {
            Self::Ed25519(key) => Ok(json!({
                "crv": "Ed25519",
                "kty": "OKP",
                "x": b64url(key.verifying_key().as_bytes()),
            })),
            Self::P256(key) => {
                use p256::elliptic_curve::sec1::ToEncodedPoint;
                let point = p256::PublicKey::from(key.verifying_key()).to_encoded_point(false);
                let (x, y) = point
                    .x()
                    .zip(point.y())
                    .ok_or_else(|| anyhow!("P-256 public key has no affine coordinates"))?;
                Ok(json!({
                    "crv": "P-256",
                    "kty": "EC",
                    "x": b64url(x),
                    "y": b64url(y),
                }))
            }
        }
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => {
                use ed25519_dalek::Signer;
                key.sign(input).to_bytes().to_vec()
            }
            Self::P256(key) => {
                use p256::ecdsa::signature::Signer;
                // JWS wants raw r || s, not DER
                let sig: p256::ecdsa::Signature = key.sign(input);
                sig.to_bytes().to_vec()
            }
        }
    }
}

fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn sha256_b64url(input: &[u8]) -> String {
    b64url(&Sha256::digest(input))
}

fn now_unix() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?;
    Ok(elapsed.as_secs() as i64)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let pem = fs::read_to_string(&args.key)
        .with_context(|| format!("failed to read {}", args.key.display()))?;
    let key = SigningKey::from_pem(args.key_type, &pem)?;

    // serde_json keeps object keys sorted, so to_string() is the RFC 7638 canonical form.
    let jwk = key.public_jwk()?;
    let jkt = sha256_b64url(serde_json::to_string(&jwk)?.as_bytes());

    let ath = args.access_token.as_deref().map(|t| sha256_b64url(t.as_bytes()));
    let iat = match args.iat {
        Some(iat) => iat,
        None => now_unix()?,
    };
    let jti = args.jti.unwrap_or_else(|| Uuid::new_v4().to_string());

    let header = json!({
        "typ": "dpop+jwt",
        "alg": key.alg(),
        "jwk": jwk,
    });

    let mut claims = Map::new();
    claims.insert("jti".into(), Value::String(jti.clone()));
    claims.insert("htm".into(), Value::String(args.method.clone()));
    claims.insert("htu".into(), Value::String(args.url.clone()));
    claims.insert("iat".into(), Value::from(iat));
    if let Some(ath) = &ath {
        claims.insert("ath".into(), Value::String(ath.clone()));
    }

    let signing_input = format!(
        "{}.{}",
        b64url(serde_json::to_string(&header)?.as_bytes()),
        b64url(serde_json::to_string(&claims)?.as_bytes()),
    );
    let signature = key.sign(signing_input.as_bytes());
    let proof = format!("{}.{}", signing_input, b64url(&signature));

    if args.quiet {
        println!("{}", proof);
        return Ok(());
    }

    println!("DPoP: {}", proof);
    println!("jkt (cnf.jkt): {}", jkt);
    println!("alg: {}", key.alg());
    println!("iat: {}", iat);
    println!("jti: {}", jti);
    match ath {
        Some(ath) => println!("ath: {}", ath),
        None => println!("ath: (none)"),
    }

    Ok(())
}
