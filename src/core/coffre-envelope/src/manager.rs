//! The Envelope Manager.

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use coffre_crypto::{asymmetric::validate_identity, CryptoError, PrivateKey, PublicKey};

use crate::config::EnvelopeConfig;
use crate::engine::{key_to_text, text_to_key, AesGcmEngine, AsymmetricEngine, SymmetricEngine, X25519Engine};
use crate::error::EnvelopeError;
use crate::keypair::{EncryptedItem, KeyPair, MasterKeys, PlaintextItem, StoredItem, UnwrappedKey};

/// Lifecycle state of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// No key pair yet; only `provision`, `load` and accessors are usable.
    Uninitialized,
    /// Key pair loaded; items can be encrypted and decrypted.
    Ready,
}

enum KeyState {
    Uninitialized,
    Ready(KeyPair),
}

/// Orchestrates key-pair lifecycle and per-item envelope encryption for one
/// identity.
///
/// The key pair is set exactly once, by [`provision`](Self::provision) or
/// [`load`](Self::load), both of which consume the manager and hand it back.
/// Afterwards every operation takes `&self`, so a ready manager can be shared
/// behind an `Arc` and used from several tasks at once.
pub struct EnvelopeManager<A = X25519Engine, S = AesGcmEngine> {
    identity: String,
    passphrase: Zeroizing<String>,
    asymmetric: A,
    symmetric: S,
    state: KeyState,
}

impl EnvelopeManager {
    /// Creates a manager with the default engines and configuration.
    pub fn new(identity: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self::with_config(identity, passphrase, EnvelopeConfig::default())
    }

    /// Creates a manager with the default engines.
    pub fn with_config(
        identity: impl Into<String>,
        passphrase: impl Into<String>,
        config: EnvelopeConfig,
    ) -> Self {
        Self::with_engines(
            identity,
            passphrase,
            X25519Engine::new(config.kdf),
            AesGcmEngine::new(),
        )
    }
}

impl<A, S> EnvelopeManager<A, S>
where
    A: AsymmetricEngine,
    S: SymmetricEngine,
{
    /// Creates a manager over custom engines.
    pub fn with_engines(
        identity: impl Into<String>,
        passphrase: impl Into<String>,
        asymmetric: A,
        symmetric: S,
    ) -> Self {
        Self {
            identity: identity.into(),
            passphrase: Zeroizing::new(passphrase.into()),
            asymmetric,
            symmetric,
            state: KeyState::Uninitialized,
        }
    }

    /// Identity this manager was constructed with.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the lifecycle state.
    pub fn status(&self) -> KeyStatus {
        match self.state {
            KeyState::Uninitialized => KeyStatus::Uninitialized,
            KeyState::Ready(_) => KeyStatus::Ready,
        }
    }

    /// Returns true once a key pair is loaded.
    pub fn is_ready(&self) -> bool {
        self.status() == KeyStatus::Ready
    }

    /// Public-key fingerprint, if a key pair is loaded.
    pub fn fingerprint(&self) -> Option<String> {
        match &self.state {
            KeyState::Uninitialized => None,
            KeyState::Ready(pair) => Some(pair.fingerprint()),
        }
    }

    fn key_pair(&self) -> Result<&KeyPair, EnvelopeError> {
        match &self.state {
            KeyState::Uninitialized => Err(EnvelopeError::NotInitialized),
            KeyState::Ready(pair) => Ok(pair),
        }
    }

    fn ensure_uninitialized(&self) -> Result<(), EnvelopeError> {
        match self.state {
            KeyState::Uninitialized => Ok(()),
            KeyState::Ready(_) => Err(EnvelopeError::AlreadyInitialized),
        }
    }

    // ========================================================================
    // Key-Pair Lifecycle
    // ========================================================================

    /// Generates a new key pair for the configured identity, protected by the
    /// configured passphrase.
    ///
    /// The freshly protected private key is opened again before it is
    /// accepted. Any failure drops the manager.
    pub async fn provision(mut self) -> Result<Self, EnvelopeError> {
        self.ensure_uninitialized()?;
        validate_identity(&self.identity)
            .map_err(|e| EnvelopeError::InvalidIdentity(e.to_string()))?;

        let serialized = self
            .asymmetric
            .generate_key_pair(&self.passphrase, &self.identity)
            .await
            .map_err(EnvelopeError::KeyGenerationFailure)?;

        let (private_key, public_key) = self
            .open_key_pair(&serialized.private_key, &serialized.public_key)
            .await
            .map_err(EnvelopeError::KeyGenerationFailure)?;
        self.check_identity(&private_key, &public_key)?;

        let pair = KeyPair::new(private_key, public_key, serialized.into());
        info!(
            identity = %self.identity,
            fingerprint = %pair.fingerprint(),
            "Key pair provisioned"
        );

        self.state = KeyState::Ready(pair);
        Ok(self)
    }

    /// Loads a previously provisioned key pair from its serialized halves.
    ///
    /// The strings are kept verbatim and returned as-is by
    /// [`export_master_keys`](Self::export_master_keys).
    pub async fn load(
        mut self,
        encrypted_private_key: &str,
        public_key: &str,
    ) -> Result<Self, EnvelopeError> {
        self.ensure_uninitialized()?;

        let (private, public) = self
            .open_key_pair(encrypted_private_key, public_key)
            .await
            .map_err(|e| match e {
                CryptoError::PassphraseMismatch => {
                    warn!(identity = %self.identity, "Key pair load rejected: passphrase mismatch");
                    EnvelopeError::PassphraseMismatch
                },
                other => EnvelopeError::InvalidSerializedKey(other),
            })?;
        self.check_identity(&private, &public)?;

        let serialized = MasterKeys {
            private_key: encrypted_private_key.to_string(),
            public_key: public_key.to_string(),
        };
        let pair = KeyPair::new(private, public, serialized);
        info!(
            identity = %self.identity,
            fingerprint = %pair.fingerprint(),
            "Key pair loaded"
        );

        self.state = KeyState::Ready(pair);
        Ok(self)
    }

    /// Opens the private key and imports the public key concurrently, then
    /// checks that they are two halves of one pair.
    async fn open_key_pair(
        &self,
        private_key: &str,
        public_key: &str,
    ) -> Result<(PrivateKey, PublicKey), CryptoError> {
        let (private, public) = tokio::try_join!(
            self.asymmetric
                .decrypt_private_key(private_key, &self.passphrase),
            self.asymmetric.read_public_key(public_key),
        )?;

        if private.public_key().as_bytes() != public.as_bytes() {
            return Err(CryptoError::InvalidKey(
                "public key does not belong to private key".into(),
            ));
        }

        Ok((private, public))
    }

    fn check_identity(&self, private: &PrivateKey, public: &PublicKey) -> Result<(), EnvelopeError> {
        for found in [private.identity(), public.identity()] {
            if found != self.identity {
                return Err(EnvelopeError::IdentityMismatch {
                    expected: self.identity.clone(),
                    found: found.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the serialized key-pair halves, or empty strings before
    /// provision/load.
    pub fn export_master_keys(&self) -> MasterKeys {
        match &self.state {
            KeyState::Uninitialized => MasterKeys::default(),
            KeyState::Ready(pair) => pair.serialized().clone(),
        }
    }

    // ========================================================================
    // Per-Item Key Wrapping
    // ========================================================================

    /// Wraps raw item key bytes under the manager's key pair.
    pub async fn encrypt_key(&self, raw_key: &[u8]) -> Result<String, EnvelopeError> {
        let pair = self.key_pair()?;
        let text = key_to_text(raw_key);

        pair.wrap(&self.asymmetric, &text)
            .await
            .map_err(EnvelopeError::WrapFailure)
    }

    /// Unwraps an item key produced by [`encrypt_key`](Self::encrypt_key) on
    /// the same key pair.
    pub async fn decrypt_key(&self, wrapped_key: &str) -> Result<UnwrappedKey, EnvelopeError> {
        let pair = self.key_pair()?;

        let key = pair
            .unwrap(&self.asymmetric, wrapped_key)
            .await
            .map_err(|e| {
                debug!(identity = %self.identity, error = %e, "Item key unwrap rejected");
                EnvelopeError::UnwrapFailure(e)
            })?;
        let bytes = text_to_key(&key).map_err(EnvelopeError::UnwrapFailure)?;
        let key_obj = self
            .symmetric
            .import_key(&bytes)
            .await
            .map_err(EnvelopeError::UnwrapFailure)?;

        Ok(UnwrappedKey { key, key_obj })
    }

    // ========================================================================
    // Item Encryption/Decryption
    // ========================================================================

    /// Encrypts an item under a fresh key and wraps that key.
    pub async fn encrypt(&self, plaintext: &str) -> Result<EncryptedItem, EnvelopeError> {
        self.key_pair()?;

        let key_obj = self
            .symmetric
            .create_encryption_key()
            .await
            .map_err(EnvelopeError::KeyGenerationFailure)?;
        let key_hex = key_obj.to_hex();

        let (encrypted_key, encrypted_value) = tokio::try_join!(
            self.encrypt_key(key_obj.as_bytes()),
            async {
                self.symmetric
                    .encrypt(&key_hex, plaintext)
                    .await
                    .map_err(EnvelopeError::PayloadEncryptionFailure)
            },
        )?;

        debug!(identity = %self.identity, "Item encrypted");

        Ok(EncryptedItem {
            encrypted_key,
            encrypted_value,
            key_obj,
        })
    }

    /// Decrypts an item from its wrapped key and ciphertext.
    pub async fn decrypt(
        &self,
        encrypted_key: &str,
        encrypted_value: &str,
    ) -> Result<PlaintextItem, EnvelopeError> {
        let UnwrappedKey { key, key_obj } = self.decrypt_key(encrypted_key).await?;

        let value = self
            .symmetric
            .decrypt(&key, encrypted_value)
            .await
            .map_err(|e| {
                debug!(identity = %self.identity, error = %e, "Payload decryption rejected");
                EnvelopeError::PayloadDecryptionFailure(e)
            })?;

        debug!(identity = %self.identity, "Item decrypted");

        Ok(PlaintextItem {
            key,
            value,
            key_obj,
        })
    }

    /// Decrypts a persisted item.
    pub async fn decrypt_stored(&self, item: &StoredItem) -> Result<PlaintextItem, EnvelopeError> {
        self.decrypt(&item.encrypted_key, &item.encrypted_value)
            .await
    }
}

impl<A, S> std::fmt::Debug for EnvelopeManager<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self.state {
            KeyState::Uninitialized => KeyStatus::Uninitialized,
            KeyState::Ready(_) => KeyStatus::Ready,
        };
        f.debug_struct("EnvelopeManager")
            .field("identity", &self.identity)
            .field("passphrase", &"[REDACTED]")
            .field("status", &status)
            .finish()
    }
}
