use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

/// Header carrying the platform's request signature.
pub const SIGNATURE_HEADER: &str = "X-Elis-Signature";

const SIGNATURE_SCHEME: &str = "sha1";

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingHeader,
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify the `sha1=<hex digest>` signature over the exact raw body.
/// Comparison is constant-time via the mac verification itself.
pub fn verify_signature(
    headers: &HeaderMap,
    body: &[u8],
    secret_key: &str,
) -> Result<(), SignatureError> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::MissingHeader)?;
    let (scheme, digest_hex) = header
        .split_once('=')
        .ok_or(SignatureError::MalformedHeader)?;
    if scheme != SIGNATURE_SCHEME {
        return Err(SignatureError::MalformedHeader);
    }
    let digest = hex::decode(digest_hex).map_err(|_| SignatureError::MalformedHeader)?;

    let mut mac = new_mac(secret_key);
    mac.update(body);
    mac.verify_slice(&digest)
        .map_err(|_| SignatureError::Mismatch)
}

/// Produce the signature header value for a body, as the platform would.
#[cfg(test)]
pub fn sign(body: &[u8], secret_key: &str) -> String {
    let mut mac = new_mac(secret_key);
    mac.update(body);
    format!(
        "{SIGNATURE_SCHEME}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

fn new_mac(secret_key: &str) -> HmacSha1 {
    // HMAC accepts keys of any length.
    HmacSha1::new_from_slice(secret_key.as_bytes()).expect("hmac key")
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
