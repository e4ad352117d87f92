//! Timestamped HMAC-SHA256 webhook signatures.
//!
//! Header format: `t=<unix seconds>,v1=<hex signature>[,v1=<hex signature>...]`.
//! The signed payload is `"{t}.{body}"`, keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_SCHEME: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No signature header provided")]
    MissingHeader,

    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    #[error("No signatures found with expected scheme")]
    NoSignatures,

    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,

    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,

    #[error("Webhook signing secret is not configured")]
    InvalidSecret,
}

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| SignatureError::MalformedHeader)?,
                    )
                }
                SIGNATURE_SCHEME => signatures.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
///
/// Fails with [`SignatureError::InvalidSecret`] when `secret` is empty.
pub fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::InvalidSecret);
    }
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a header value for `payload`, as the provider would send it.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},{}={}", timestamp, SIGNATURE_SCHEME, signature))
}

/// Verify a signature header against the raw payload.
///
/// `tolerance_seconds == 0` disables the timestamp window. The result depends
/// only on the arguments; `now` is passed in rather than read from the clock.
pub fn verify_signature_header(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_seconds: u64,
    now: i64,
) -> Result<SignatureHeader, SignatureError> {
    let parsed = SignatureHeader::parse(header)?;
    let expected = compute_signature(secret, parsed.timestamp, payload)?;

    let matched = parsed.signatures.iter().any(|candidate| {
        candidate.len() == expected.len()
            && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if tolerance_seconds > 0 && now.abs_diff(parsed.timestamp) > tolerance_seconds {
        return Err(SignatureError::TimestampOutsideTolerance);
    }

    Ok(parsed)
}
