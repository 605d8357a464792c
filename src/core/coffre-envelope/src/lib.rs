//! # Coffre Envelope Manager
//!
//! Per-item envelope encryption under a single passphrase-protected key pair.
//!
//! ## Model
//!
//! - One X25519 key pair per identity, private half protected by a passphrase
//! - Every item gets a fresh AES-256-GCM key
//! - The item key is wrapped with a box addressed from the key pair to itself
//! - Wrapped key and ciphertext are persisted together as a [`StoredItem`]
//!
//! ## Lifecycle
//!
//! A manager starts uninitialized. [`EnvelopeManager::provision`] generates a
//! key pair and [`EnvelopeManager::load`] restores one from its serialized form.
//! Only then do item operations succeed.
//!
//! ```no_run
//! # async fn demo() -> Result<(), coffre_envelope::EnvelopeError> {
//! use coffre_envelope::EnvelopeManager;
//!
//! let manager = EnvelopeManager::new("user-1", "correct-horse")
//!     .provision()
//!     .await?;
//!
//! let item = manager.encrypt("hello world").await?;
//! let plain = manager
//!     .decrypt(&item.encrypted_key, &item.encrypted_value)
//!     .await?;
//! assert_eq!(plain.value.as_str(), "hello world");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
mod keypair;
pub mod manager;

pub use config::EnvelopeConfig;
pub use engine::{AesGcmEngine, AsymmetricEngine, SymmetricEngine, X25519Engine};
pub use error::EnvelopeError;
pub use keypair::{EncryptedItem, MasterKeys, PlaintextItem, StoredItem, UnwrappedKey};
pub use manager::{EnvelopeManager, KeyStatus};

pub use coffre_crypto::{KdfParams, KdfProfile, SymmetricKey};
