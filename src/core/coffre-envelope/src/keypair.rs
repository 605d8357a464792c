//! Key pair held by a ready manager, and the item types it produces.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use coffre_crypto::{CryptoResult, PrivateKey, PublicKey, SerializedKeyPair, SymmetricKey};

use crate::engine::AsymmetricEngine;

/// Serialized key-pair halves, safe to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterKeys {
    /// Passphrase-protected private key, empty before provision/load.
    pub private_key: String,
    /// Public key, empty before provision/load.
    pub public_key: String,
}

impl From<SerializedKeyPair> for MasterKeys {
    fn from(pair: SerializedKeyPair) -> Self {
        Self {
            private_key: pair.private_key,
            public_key: pair.public_key,
        }
    }
}

/// A usable key pair addressed to itself.
///
/// The owner is both sender and recipient of every wrapped key, so wrap and
/// unwrap take no recipient argument.
pub(crate) struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    serialized: MasterKeys,
}

impl KeyPair {
    pub(crate) fn new(private_key: PrivateKey, public_key: PublicKey, serialized: MasterKeys) -> Self {
        Self {
            private_key,
            public_key,
            serialized,
        }
    }

    pub(crate) fn serialized(&self) -> &MasterKeys {
        &self.serialized
    }

    pub(crate) fn fingerprint(&self) -> String {
        self.public_key.fingerprint()
    }

    /// Encrypts `text` so only this key pair can read it.
    pub(crate) async fn wrap<A>(&self, engine: &A, text: &str) -> CryptoResult<String>
    where
        A: AsymmetricEngine + ?Sized,
    {
        engine.encrypt(&self.private_key, &self.public_key, text).await
    }

    /// Decrypts text produced by [`KeyPair::wrap`] on the same key pair.
    pub(crate) async fn unwrap<A>(&self, engine: &A, wrapped: &str) -> CryptoResult<Zeroizing<String>>
    where
        A: AsymmetricEngine + ?Sized,
    {
        engine.decrypt(&self.private_key, &self.public_key, wrapped).await
    }
}

/// Result of encrypting an item.
///
/// `encrypted_key` and `encrypted_value` only decrypt together.
#[derive(Debug, Clone)]
pub struct EncryptedItem {
    /// Item key wrapped under the manager's key pair.
    pub encrypted_key: String,
    /// Payload encrypted under the item key.
    pub encrypted_value: String,
    /// Usable handle for the item key.
    pub key_obj: SymmetricKey,
}

impl EncryptedItem {
    /// Returns the persistable part of the item.
    pub fn stored(&self) -> StoredItem {
        StoredItem {
            encrypted_key: self.encrypted_key.clone(),
            encrypted_value: self.encrypted_value.clone(),
        }
    }
}

/// Persistable form of an encrypted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Item key wrapped under the manager's key pair.
    pub encrypted_key: String,
    /// Payload encrypted under the item key.
    pub encrypted_value: String,
}

/// An unwrapped item key.
pub struct UnwrappedKey {
    /// Item key as hex text.
    pub key: Zeroizing<String>,
    /// Usable handle for the item key.
    pub key_obj: SymmetricKey,
}

impl std::fmt::Debug for UnwrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnwrappedKey")
            .field("key", &"[REDACTED]")
            .field("key_obj", &self.key_obj)
            .finish()
    }
}

/// Result of decrypting an item.
pub struct PlaintextItem {
    /// Item key as hex text.
    pub key: Zeroizing<String>,
    /// Decrypted payload.
    pub value: Zeroizing<String>,
    /// Usable handle for the item key.
    pub key_obj: SymmetricKey,
}

impl std::fmt::Debug for PlaintextItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaintextItem")
            .field("key", &"[REDACTED]")
            .field("value", &"[REDACTED]")
            .field("key_obj", &self.key_obj)
            .finish()
    }
}
