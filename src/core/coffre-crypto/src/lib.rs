//! # Coffre Crypto
//!
//! Cryptographic primitives for Coffre envelope encryption.
//!
//! This crate provides the synchronous building blocks:
//! - Symmetric encryption (AES-256-GCM)
//! - Asymmetric encryption (X25519 + XSalsa20-Poly1305)
//! - Key derivation (Argon2id, HKDF-SHA256)
//! - Hex and framed base64 encodings
//! - Secure random generation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aead;
pub mod asymmetric;
pub mod encoding;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod payload;
pub mod random;

pub use asymmetric::{PrivateKey, PublicKey, SerializedKeyPair};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{KdfParams, KdfProfile};
pub use keys::SymmetricKey;
