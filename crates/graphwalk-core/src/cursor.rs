//! Signed, expiring, opaque cursor tokens (C5).
//!
//! Two base64url parts joined by a dot: `payload.signature`. The payload is
//! compact JSON `{sid, qh, iat, exp}`; the signature is HMAC-SHA256 over the
//! payload-b64 bytes using a process secret. A cursor is a bearer reference
//! to server-side session state, not a serialized frontier: short tokens,
//! cheap expiration rotation, and tampering cannot resume into an invalid
//! state (see DESIGN.md).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const DEFAULT_CURSOR_TTL_SECONDS: i64 = 600;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("INVALID_CURSOR: {0}")]
    Invalid(String),
    #[error("CURSOR_EXPIRED: token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Decoded cursor payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPayload {
    pub sid: String,
    pub qh: String,
    pub iat: i64,
    pub exp: i64,
}

impl CursorPayload {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Issues and verifies signed cursor tokens bound to a process-wide secret.
#[derive(Clone)]
pub struct CursorCodec {
    secret: Vec<u8>,
}

impl CursorCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `(session_id, query_hash)`, expiring `ttl` from
    /// now. Re-issuing for the same pair extends expiry from *now* (sliding
    /// TTL); previously issued tokens remain valid until their own `exp`.
    pub fn issue(&self, session_id: &str, query_hash: &str, ttl: Duration) -> (String, DateTime<Utc>) {
        let now = Utc::now();
        let exp = now + ttl;
        let payload = CursorPayload {
            sid: session_id.to_string(),
            qh: query_hash.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let payload_json = serde_json::to_vec(&payload).expect("CursorPayload always serializes");
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json);

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC accepts key of any length");
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_b64 = URL_SAFE_NO_PAD.encode(signature);

        (format!("{payload_b64}.{signature_b64}"), exp)
    }

    /// Verify a token's signature and expiry, returning the decoded
    /// payload. Unforgeability relies on `Mac::verify_slice`'s
    /// constant-time comparison.
    pub fn verify(&self, token: &str) -> Result<CursorPayload, CursorError> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| CursorError::Invalid("malformed token: missing separator".to_string()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| CursorError::Invalid(format!("bad signature encoding: {e}")))?;

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC accepts key of any length");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CursorError::Invalid("signature mismatch".to_string()))?;

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| CursorError::Invalid(format!("bad payload encoding: {e}")))?;
        let payload: CursorPayload = serde_json::from_slice(&payload_json)
            .map_err(|e| CursorError::Invalid(format!("bad payload json: {e}")))?;

        if payload.exp < Utc::now().timestamp() {
            return Err(CursorError::Expired(payload.expires_at()));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CursorCodec {
        CursorCodec::new(b"test-secret".to_vec())
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let codec = codec();
        let (token, _exp) = codec.issue("sid-1", "A:2", Duration::minutes(10));
        let payload = codec.verify(&token).expect("valid token");
        assert_eq!(payload.sid, "sid-1");
        assert_eq!(payload.qh, "A:2");
    }

    #[test]
    fn expired_token_yields_expired_error() {
        let codec = codec();
        let (token, _exp) = codec.issue("sid-1", "A:2", Duration::seconds(-1));
        match codec.verify(&token) {
            Err(CursorError::Expired(_)) => {}
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn malformed_token_without_dot_is_invalid() {
        let codec = codec();
        match codec.verify("not-a-cursor") {
            Err(CursorError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn flipped_payload_bit_invalidates_signature() {
        let codec = codec();
        let (token, _exp) = codec.issue("sid-1", "A:2", Duration::minutes(10));
        let (payload_b64, sig_b64) = token.split_once('.').unwrap();
        let mut tampered = payload_b64.as_bytes().to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        let tampered_token = format!("{}.{}", String::from_utf8_lossy(&tampered), sig_b64);
        match codec.verify(&tampered_token) {
            Err(CursorError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn flipped_signature_bit_invalidates_token() {
        let codec = codec();
        let (token, _exp) = codec.issue("sid-1", "A:2", Duration::minutes(10));
        let (payload_b64, sig_b64) = token.split_once('.').unwrap();
        let mut sig = sig_b64.as_bytes().to_vec();
        let last = sig.len() - 1;
        sig[last] = if sig[last] == b'A' { b'B' } else { b'A' };
        let tampered_token = format!("{}.{}", payload_b64, String::from_utf8_lossy(&sig));
        match codec.verify(&tampered_token) {
            Err(CursorError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let issuer = CursorCodec::new(b"secret-a".to_vec());
        let verifier = CursorCodec::new(b"secret-b".to_vec());
        let (token, _exp) = issuer.issue("sid-1", "A:2", Duration::minutes(10));
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn reissuing_extends_expiry_from_now() {
        let codec = codec();
        let (_first, exp1) = codec.issue("sid-1", "A:2", Duration::minutes(10));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let (_second, exp2) = codec.issue("sid-1", "A:2", Duration::minutes(10));
        assert!(exp2 >= exp1);
    }
}
