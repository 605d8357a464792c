//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (authentication tag rejected, wrong key).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The passphrase does not open the protected private key.
    #[error("passphrase does not match the protected key")]
    PassphraseMismatch,

    /// Invalid key format or size.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Text could not be decoded (hex, base64, JSON envelope).
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The worker running the operation went away before finishing.
    #[error("crypto backend unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
