//! Refresh token sealing for storage.
//!
//! Sealed form: `v1.` + base64url(nonce || ciphertext). The owning user id is
//! bound as associated data, so a token copied onto another user's row fails
//! to open.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use rand::RngCore;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const VERSION_PREFIX: &str = "v1.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("TOKEN_ENCRYPTION_KEY is not valid base64")]
    KeyEncoding,

    #[error("TOKEN_ENCRYPTION_KEY must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("sealed token is malformed")]
    Malformed,

    #[error("sealed token failed authentication")]
    Unauthentic,

    #[error("token sealing failed")]
    Seal,
}

/// AES-256-GCM sealing of refresh tokens, keyed per deployment.
pub struct TokenCipher {
    aead: Aes256Gcm,
}

impl TokenCipher {
    /// Build from the base64-encoded `TOKEN_ENCRYPTION_KEY`.
    pub fn new(key_b64: &str) -> Result<Self, CipherError> {
        let key = STANDARD
            .decode(key_b64.trim())
            .map_err(|_| CipherError::KeyEncoding)?;
        if key.len() != KEY_LEN {
            return Err(CipherError::KeyLength(key.len()));
        }

        let aead = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::KeyLength(key.len()))?;
        Ok(Self { aead })
    }

    pub fn seal(&self, external_user_id: &str, token: &str) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .aead
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: token.as_bytes(),
                    aad: external_user_id.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Seal)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(format!("{VERSION_PREFIX}{}", URL_SAFE_NO_PAD.encode(out)))
    }

    pub fn open(&self, external_user_id: &str, sealed: &str) -> Result<String, CipherError> {
        let body = sealed
            .strip_prefix(VERSION_PREFIX)
            .ok_or(CipherError::Malformed)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| CipherError::Malformed)?;
        if bytes.len() <= NONCE_LEN {
            return Err(CipherError::Malformed);
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let token = self
            .aead
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: external_user_id.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Unauthentic)?;

        String::from_utf8(token).map_err(|_| CipherError::Malformed)
    }
}
