//! Cryptographic wrappers.
//!
//! - [`Hasher`]: password hashing and verification (Argon2id)
//! - [`Cipher`]: symmetric string encryption (AES-256-GCM)
//!
//! Failures are reported as `AppError::Cryptography`; argument problems as
//! `AppError::InvalidArgument`.

pub mod cipher;
pub mod hasher;

pub use cipher::{AesGcmCipher, Cipher};
pub use hasher::{Argon2Hasher, Hasher};

#[cfg(any(test, feature = "test-utils"))]
pub use cipher::MockCipher;
#[cfg(any(test, feature = "test-utils"))]
pub use hasher::MockHasher;
