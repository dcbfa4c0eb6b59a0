//! Symmetric string encryption (AES-256-GCM).
//!
//! Ciphertexts are `base64(nonce || ciphertext || tag)` with a fresh 96-bit
//! nonce per message.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use base64::{engine::general_purpose, Engine as _};
use common::constants::CIPHER_NONCE_LENGTH;
use common::{AppError, AppResult, CipherConfig, SourcedError};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Minimum salt length accepted by Argon2 key derivation
const MIN_SALT_LENGTH: usize = 8;

/// Symmetric cipher service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plain_text: &str) -> AppResult<String>;
    fn decrypt(&self, cipher_text: &str) -> AppResult<String>;
}

/// AES-256-GCM cipher with a key derived from a passphrase.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AesGcmCipher {
    /// Derive a 256-bit key from `passphrase` and `salt` with Argon2.
    pub fn new(passphrase: &str, salt: &str) -> AppResult<Self> {
        if passphrase.is_empty() {
            return Err(AppError::invalid_argument("cipher passphrase must not be empty"));
        }
        if salt.len() < MIN_SALT_LENGTH {
            return Err(AppError::invalid_argument(format!(
                "cipher salt must be at least {} bytes",
                MIN_SALT_LENGTH
            )));
        }

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut key)
            .map_err(|e| AppError::cryptography("Key derivation failed", e))?;

        Ok(Self::from_key(key))
    }

    /// Use a raw 256-bit key.
    pub fn from_key(key: [u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(&key.into()),
        }
    }

    pub fn from_config(config: &CipherConfig) -> AppResult<Self> {
        let passphrase = config
            .passphrase
            .as_deref()
            .ok_or_else(|| AppError::invalid_argument("CIPHER_PASSPHRASE is not configured"))?;
        Self::new(passphrase, &config.salt)
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plain_text: &str) -> AppResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plain_text.as_bytes())
            .map_err(|e| {
                tracing::error!("Encryption failed: {}", e);
                AppError::cryptography("Encryption failed", e)
            })?;

        let mut payload = Vec::with_capacity(CIPHER_NONCE_LENGTH + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(payload))
    }

    fn decrypt(&self, cipher_text: &str) -> AppResult<String> {
        if cipher_text.is_empty() {
            return Err(AppError::invalid_argument("cipher text must not be empty"));
        }

        let payload = general_purpose::STANDARD
            .decode(cipher_text)
            .map_err(|e| AppError::cryptography("Cipher text is not valid base64", e))?;

        if payload.len() <= CIPHER_NONCE_LENGTH {
            return Err(AppError::Cryptography(SourcedError::message(
                "Cipher text is truncated",
            )));
        }

        let (nonce, ciphertext) = payload.split_at(CIPHER_NONCE_LENGTH);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| {
                tracing::warn!("Rejected cipher text that failed authentication");
                AppError::cryptography("Decryption failed", e)
            })?;

        String::from_utf8(plain)
            .map_err(|e| AppError::cryptography("Decrypted value is not UTF-8", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> AesGcmCipher {
        AesGcmCipher::from_key([7u8; 32])
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = cipher();
        let sealed = cipher.encrypt("api-key-123").unwrap();
        assert_ne!(sealed, "api-key-123");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "api-key-123");
    }

    #[test]
    fn test_nonce_is_fresh_per_message() {
        let cipher = cipher();
        assert_ne!(cipher.encrypt("same").unwrap(), cipher.encrypt("same").unwrap());
    }

    #[test]
    fn test_tampered_cipher_text_rejected() {
        use std::error::Error as _;

        let cipher = cipher();
        let sealed = cipher.encrypt("secret").unwrap();
        let mut bytes = general_purpose::STANDARD.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = general_purpose::STANDARD.encode(bytes);

        let err = cipher.decrypt(&tampered).unwrap_err();
        assert_eq!(err.code(), "CRYPTOGRAPHY_ERROR");

        let context = err.source().unwrap();
        let cause = context.source().unwrap();
        assert!(cause.downcast_ref::<aes_gcm::Error>().is_some());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = cipher().encrypt("secret").unwrap();
        let other = AesGcmCipher::from_key([8u8; 32]);
        assert!(other.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_truncated_and_garbage_input() {
        let cipher = cipher();
        let short = general_purpose::STANDARD.encode([0u8; 4]);
        assert_eq!(cipher.decrypt(&short).unwrap_err().code(), "CRYPTOGRAPHY_ERROR");

        let err = cipher.decrypt("%%%not-base64%%%").unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
        assert!(cipher.decrypt("").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_passphrase_derivation_is_deterministic() {
        let first = AesGcmCipher::new("passphrase", "salt-value").unwrap();
        let second = AesGcmCipher::new("passphrase", "salt-value").unwrap();
        let sealed = first.encrypt("shared").unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap(), "shared");
    }

    #[test]
    fn test_invalid_construction() {
        assert!(AesGcmCipher::new("", "salt-value").unwrap_err().is_invalid_argument());
        assert!(AesGcmCipher::new("pass", "short").unwrap_err().is_invalid_argument());
        assert!(AesGcmCipher::from_config(&CipherConfig::default())
            .unwrap_err()
            .is_invalid_argument());
    }
}
