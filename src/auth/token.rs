//! Session token issuance and verification
//!
//! Tokens are sealed with AES-256-GCM under a process-wide symmetric key:
//!
//! ```text
//! v1.<base64url(nonce[12] || ciphertext || tag[16])>
//! ```
//!
//! The plaintext is the JSON-encoded [`TokenPayload`] and the version label is
//! bound as associated data, so any modification of the token (label, nonce,
//! ciphertext or tag) fails authentication. Tokens are self-contained: nothing
//! is stored server-side and a token stays valid until it expires.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Version label prefixed to every token and authenticated with it
pub const TOKEN_VERSION: &str = "v1";

/// Shortest secret accepted for key derivation, in bytes
pub const MIN_SECRET_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Malformed or inauthentic; deliberately carries no detail
    #[error("token is invalid")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("invalid token request: {0}")]
    InvalidRequest(&'static str),

    #[error("invalid token key: {0}")]
    InvalidKey(String),

    #[error("token creation failed: {0}")]
    TokenCreationFailure(String),
}

/// Claims carried inside a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Random token identifier
    pub id: Uuid,
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "iat")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp")]
    pub expires_at: DateTime<Utc>,
}

impl TokenPayload {
    pub fn lifetime(&self) -> chrono::Duration {
        self.expires_at - self.issued_at
    }
}

/// 256-bit symmetric key
#[derive(Clone)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the key from a configured secret string
    pub fn derive(secret: &str) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::InvalidKey(format!(
                "secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Ok(Self(key))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues and verifies session tokens under one key
///
/// Immutable once built; clone it or share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenManager {
    cipher: Aes256Gcm,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    pub fn new(key: &SymmetricKey) -> Self {
        Self::with_clock(key, Arc::new(SystemClock))
    }

    pub fn with_clock(key: &SymmetricKey, clock: Arc<dyn Clock>) -> Self {
        Self {
            cipher: Aes256Gcm::new((&key.0).into()),
            clock,
        }
    }

    /// Create a token for `subject` that expires after `duration`
    ///
    /// Returns the opaque token together with its payload so callers can read
    /// `expires_at` without parsing the token again.
    pub fn create_token(
        &self,
        subject: &str,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError> {
        if subject.is_empty() {
            return Err(TokenError::InvalidRequest("subject must not be empty"));
        }
        if duration.is_zero() {
            return Err(TokenError::InvalidRequest("duration must be positive"));
        }
        let lifetime = chrono::Duration::from_std(duration)
            .map_err(|_| TokenError::InvalidRequest("duration is out of range"))?;

        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .ok_or(TokenError::InvalidRequest("expiry is out of range"))?;

        let payload = TokenPayload {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            issued_at,
            expires_at,
        };

        let plaintext = serde_json::to_vec(&payload)
            .map_err(|e| TokenError::TokenCreationFailure(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| TokenError::TokenCreationFailure(e.to_string()))?;

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &plaintext,
                    aad: TOKEN_VERSION.as_bytes(),
                },
            )
            .map_err(|e| TokenError::TokenCreationFailure(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        let token = format!("{}.{}", TOKEN_VERSION, URL_SAFE_NO_PAD.encode(&sealed));

        tracing::debug!(
            token_id = %payload.id,
            subject = %payload.subject,
            expires_at = %payload.expires_at,
            "Issued session token"
        );

        Ok((token, payload))
    }

    /// Verify a possibly attacker-controlled token and return its payload
    pub fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let payload = self.open(token).map_err(|reason| {
            tracing::debug!(reason, "Rejected session token");
            TokenError::InvalidToken
        })?;

        if self.clock.now() >= payload.expires_at {
            tracing::debug!(
                token_id = %payload.id,
                expired_at = %payload.expires_at,
                "Session token expired"
            );
            return Err(TokenError::ExpiredToken);
        }

        Ok(payload)
    }

    /// Structural and authenticity checks; nothing is trusted before the tag verifies
    fn open(&self, token: &str) -> Result<TokenPayload, &'static str> {
        let (version, body) = token.split_once('.').ok_or("missing version label")?;
        if version != TOKEN_VERSION {
            return Err("unknown version label");
        }

        let sealed = URL_SAFE_NO_PAD.decode(body).map_err(|_| "bad encoding")?;
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err("too short");
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: TOKEN_VERSION.as_bytes(),
                },
            )
            .map_err(|_| "authentication failed")?;

        let payload: TokenPayload =
            serde_json::from_slice(&plaintext).map_err(|_| "bad claims")?;
        if payload.subject.is_empty() || payload.expires_at <= payload.issued_at {
            return Err("bad claims");
        }

        Ok(payload)
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::sync::Mutex;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn set(&self, now: DateTime<Utc>) {
            *self.0.lock().unwrap() = now;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn test_key() -> SymmetricKey {
        SymmetricKey::from_bytes([0x42; 32])
    }

    fn manager() -> TokenManager {
        TokenManager::new(&test_key())
    }

    fn flip(token: &str, index: usize, mask: u8) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[index] ^= mask;
        // Tokens are ASCII and masks stay below 0x80.
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_create_verify_roundtrip() {
        let tokens = manager();
        let (token, payload) = tokens
            .create_token("alice", Duration::from_secs(60))
            .unwrap();

        assert!(token.starts_with("v1."));
        assert_eq!(payload.subject, "alice");
        assert_eq!(payload.lifetime(), chrono::Duration::seconds(60));

        let verified = tokens.verify_token(&token).unwrap();
        assert_eq!(verified, payload);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let tokens = manager();
        let (token, _) = tokens
            .create_token("alice", Duration::from_secs(60))
            .unwrap();

        let first = tokens.verify_token(&token).unwrap();
        let second = tokens.verify_token(&token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens = manager();
        let (a, pa) = tokens.create_token("alice", Duration::from_secs(60)).unwrap();
        let (b, pb) = tokens.create_token("alice", Duration::from_secs(60)).unwrap();

        assert_ne!(a, b);
        assert_ne!(pa.id, pb.id);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let tokens = manager();
        assert!(matches!(
            tokens.create_token("", Duration::from_secs(60)),
            Err(TokenError::InvalidRequest(_))
        ));
        assert!(matches!(
            tokens.create_token("alice", Duration::ZERO),
            Err(TokenError::InvalidRequest(_))
        ));
        assert!(matches!(
            tokens.create_token("alice", Duration::MAX),
            Err(TokenError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::at(start);
        let tokens = TokenManager::with_clock(&test_key(), clock.clone());

        let (token, payload) = tokens
            .create_token("alice", Duration::from_secs(60))
            .unwrap();
        assert_eq!(payload.issued_at, start);
        assert_eq!(payload.expires_at, start + chrono::Duration::seconds(60));

        clock.set(start + chrono::Duration::seconds(59));
        assert!(tokens.verify_token(&token).is_ok());

        clock.set(start + chrono::Duration::milliseconds(59_999));
        assert!(tokens.verify_token(&token).is_ok());

        clock.set(start + chrono::Duration::seconds(60));
        assert_eq!(tokens.verify_token(&token), Err(TokenError::ExpiredToken));

        clock.set(start + chrono::Duration::days(1));
        assert_eq!(tokens.verify_token(&token), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let (token, _) = manager()
            .create_token("alice", Duration::from_secs(60))
            .unwrap();

        let mut other = [0x42; 32];
        other[0] = 0xFF;
        let verifier = TokenManager::new(&SymmetricKey::from_bytes(other));
        assert_eq!(verifier.verify_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_expired_tampered_token_is_invalid_not_expired() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::at(start);
        let tokens = TokenManager::with_clock(&test_key(), clock.clone());
        let (token, _) = tokens.create_token("alice", Duration::from_secs(1)).unwrap();

        clock.set(start + chrono::Duration::hours(1));
        let tampered = flip(&token, token.len() - 1, 0x01);
        assert_eq!(tokens.verify_token(&tampered), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_malformed_tokens_are_invalid() {
        let tokens = manager();
        let (token, _) = tokens.create_token("alice", Duration::from_secs(60)).unwrap();
        let body = token.trim_start_matches("v1.");

        let cases = vec![
            String::new(),
            "v1.".to_string(),
            "v1".to_string(),
            "garbage".to_string(),
            format!("v2.{}", body),
            body.to_string(),
            format!("v1.{}=", body),
            format!("v1.{}", URL_SAFE_NO_PAD.encode([0u8; NONCE_LEN + TAG_LEN - 1])),
            format!("v1.{}", URL_SAFE_NO_PAD.encode([0u8; 64])),
            token[..token.len() - 1].to_string(),
            format!("{}A", token),
        ];

        for case in cases {
            assert_eq!(
                tokens.verify_token(&case),
                Err(TokenError::InvalidToken),
                "accepted {:?}",
                case
            );
        }
    }

    #[test]
    fn test_every_single_byte_flip_is_detected() {
        let tokens = manager();
        let (token, _) = tokens
            .create_token("alice", Duration::from_secs(60))
            .unwrap();

        for index in 0..token.len() {
            for mask in [0x01u8, 0x20, 0x40] {
                let tampered = flip(&token, index, mask);
                assert_eq!(
                    tokens.verify_token(&tampered),
                    Err(TokenError::InvalidToken),
                    "flip of byte {} with mask {:#04x} was accepted",
                    index,
                    mask
                );
            }
        }
    }

    #[test]
    fn test_derive_key() {
        assert!(matches!(
            SymmetricKey::derive("too-short"),
            Err(TokenError::InvalidKey(_))
        ));

        let secret = "0123456789abcdef0123456789abcdef";
        let a = TokenManager::new(&SymmetricKey::derive(secret).unwrap());
        let b = TokenManager::new(&SymmetricKey::derive(secret).unwrap());
        let (token, _) = a.create_token("alice", Duration::from_secs(60)).unwrap();
        // Any instance holding the same secret verifies the token.
        assert!(b.verify_token(&token).is_ok());

        let c = TokenManager::new(
            &SymmetricKey::derive("0123456789abcdef0123456789abcdeX").unwrap(),
        );
        assert_eq!(c.verify_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0x42; 32]);
        assert_eq!(format!("{:?}", key), "SymmetricKey(..)");
        assert!(!format!("{:?}", manager()).contains("42"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_roundtrip(subject in "[A-Za-z0-9_.@-]{1,40}", secs in 1u64..=30 * 86_400) {
            let tokens = manager();
            let (token, payload) = tokens
                .create_token(&subject, Duration::from_secs(secs))
                .unwrap();
            let verified = tokens.verify_token(&token).unwrap();

            prop_assert_eq!(&verified.subject, &subject);
            prop_assert_eq!(verified.lifetime(), chrono::Duration::seconds(secs as i64));
            prop_assert_eq!(verified, payload);
        }

        #[test]
        fn prop_single_byte_flip_is_rejected(
            subject in "[a-z]{1,16}",
            position in any::<prop::sample::Index>(),
            bit in 0u8..7,
        ) {
            let tokens = manager();
            let (token, _) = tokens
                .create_token(&subject, Duration::from_secs(300))
                .unwrap();

            let index = position.index(token.len());
            let tampered = flip(&token, index, 1 << bit);
            prop_assert_eq!(tokens.verify_token(&tampered), Err(TokenError::InvalidToken));
        }
    }
}
