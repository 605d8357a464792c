//! Envelope manager error types.

use coffre_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur in the Envelope Manager.
///
/// Variants that wrap an engine failure keep it as the error source.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Item operation attempted before `provision` or `load`.
    #[error("envelope manager not initialized: provision or load a key pair first")]
    NotInitialized,

    /// `provision` or `load` called on a manager that already holds a key pair.
    #[error("key pair already initialized")]
    AlreadyInitialized,

    /// The configured identity cannot be bound into a key pair.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The loaded key pair was generated for another identity.
    #[error("key pair belongs to {found:?}, expected {expected:?}")]
    IdentityMismatch {
        /// Identity the manager was constructed with.
        expected: String,
        /// Identity bound into the key pair.
        found: String,
    },

    /// Asymmetric or symmetric key generation failed.
    #[error("key generation failed: {0}")]
    KeyGenerationFailure(#[source] CryptoError),

    /// The passphrase does not open the private key.
    #[error("passphrase does not match the private key")]
    PassphraseMismatch,

    /// A serialized key is malformed or the two halves do not belong together.
    #[error("invalid serialized key: {0}")]
    InvalidSerializedKey(#[source] CryptoError),

    /// Wrapping an item key failed.
    #[error("failed to wrap item key: {0}")]
    WrapFailure(#[source] CryptoError),

    /// Unwrapping an item key failed or rejected tampered input.
    #[error("failed to unwrap item key: {0}")]
    UnwrapFailure(#[source] CryptoError),

    /// Payload encryption failed.
    #[error("payload encryption failed: {0}")]
    PayloadEncryptionFailure(#[source] CryptoError),

    /// Payload decryption rejected tampered or mis-keyed ciphertext.
    #[error("payload decryption failed: {0}")]
    PayloadDecryptionFailure(#[source] CryptoError),
}
