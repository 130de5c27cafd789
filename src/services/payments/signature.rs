//! Webhook signature verification.
//!
//! Signatures are hex-encoded HMACs over the raw request body. Comparison is
//! constant-time on the decoded bytes.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Hex HMAC-SHA512 of `payload`, the scheme Paystack uses for `x-paystack-signature`.
pub fn sign_sha512(secret: &[u8], payload: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret)
        .map_err(|e| Error::Internal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Hex HMAC-SHA256 of `payload`, the scheme Meta uses for `X-Hub-Signature-256`.
pub fn sign_sha256(secret: &[u8], payload: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| Error::Internal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex HMAC-SHA512 signature.
pub fn verify_sha512(secret: &[u8], payload: &[u8], signature_hex: &str) -> Result<()> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret)
        .map_err(|e| Error::Internal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload);
    compare(&mac.finalize().into_bytes(), signature_hex)
}

/// Verifies an `X-Hub-Signature-256` header value (`sha256=<hex>`).
pub fn verify_sha256_header(secret: &[u8], payload: &[u8], header: &str) -> Result<()> {
    let signature_hex = header
        .strip_prefix("sha256=")
        .ok_or_else(|| Error::Signature("Missing sha256= prefix".to_string()))?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| Error::Internal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload);
    compare(&mac.finalize().into_bytes(), signature_hex)
}

fn compare(expected: &[u8], provided_hex: &str) -> Result<()> {
    let provided = hex::decode(provided_hex.trim())
        .map_err(|_| Error::Signature("Invalid signature encoding".to_string()))?;

    if expected.ct_eq(&provided[..]).into() {
        Ok(())
    } else {
        Err(Error::Signature("Signature mismatch".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"sk_test_secret";
    const BODY: &[u8] = br#"{"event":"charge.success","data":{"reference":"FB_1"}}"#;

    #[test]
    fn test_sha512_round_trip() {
        let signature = sign_sha512(SECRET, BODY).unwrap();
        assert_eq!(signature.len(), 128);
        assert!(verify_sha512(SECRET, BODY, &signature).is_ok());
    }

    #[test]
    fn test_sha512_rejects_tampering() {
        let signature = sign_sha512(SECRET, BODY).unwrap();
        let tampered = br#"{"event":"charge.success","data":{"reference":"FB_2"}}"#;
        assert!(matches!(
            verify_sha512(SECRET, tampered, &signature),
            Err(Error::Signature(_))
        ));
        assert!(matches!(
            verify_sha512(b"other", BODY, &signature),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_signature() {
        assert!(matches!(
            verify_sha512(SECRET, BODY, "not-hex"),
            Err(Error::Signature(_))
        ));
        assert!(matches!(
            verify_sha512(SECRET, BODY, "abcd"),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_sha256_header() {
        let header = format!("sha256={}", sign_sha256(SECRET, BODY).unwrap());
        assert!(verify_sha256_header(SECRET, BODY, &header).is_ok());
        assert!(verify_sha256_header(SECRET, BODY, "deadbeef").is_err());
    }
}
