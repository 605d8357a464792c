//! Engines consumed by the Envelope Manager.
//!
//! The manager only talks to these traits. The default engines run every
//! CPU-bound operation on tokio's blocking pool, so operations the manager
//! joins concurrently really overlap.

use async_trait::async_trait;
use zeroize::Zeroizing;

use coffre_crypto::{
    asymmetric, encoding, payload, CryptoError, CryptoResult, KdfParams, PrivateKey, PublicKey,
    SerializedKeyPair, SymmetricKey,
};

/// Asymmetric engine: key pairs, passphrase protection, box encryption of
/// short text.
#[async_trait]
pub trait AsymmetricEngine: Send + Sync {
    /// Generates a key pair bound to `identity`, private half protected by
    /// `passphrase`.
    async fn generate_key_pair(
        &self,
        passphrase: &str,
        identity: &str,
    ) -> CryptoResult<SerializedKeyPair>;

    /// Opens a passphrase-protected private key.
    async fn decrypt_private_key(
        &self,
        encrypted: &str,
        passphrase: &str,
    ) -> CryptoResult<PrivateKey>;

    /// Imports a serialized public key.
    async fn read_public_key(&self, serialized: &str) -> CryptoResult<PublicKey>;

    /// Encrypts `text` from `private_key`'s holder to `public_key`'s holder.
    async fn encrypt(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        text: &str,
    ) -> CryptoResult<String>;

    /// Decrypts text produced by [`AsymmetricEngine::encrypt`].
    async fn decrypt(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        ciphertext: &str,
    ) -> CryptoResult<Zeroizing<String>>;
}

/// Symmetric engine: item keys and payload encryption.
#[async_trait]
pub trait SymmetricEngine: Send + Sync {
    /// Generates a fresh random item key. Raw bytes via
    /// [`SymmetricKey::as_bytes`].
    async fn create_encryption_key(&self) -> CryptoResult<SymmetricKey>;

    /// Imports raw bytes as an item key.
    async fn import_key(&self, bytes: &[u8]) -> CryptoResult<SymmetricKey>;

    /// Encrypts a payload under the hex text of an item key.
    async fn encrypt(&self, key_hex: &str, plaintext: &str) -> CryptoResult<String>;

    /// Decrypts a payload under the hex text of an item key.
    async fn decrypt(&self, key_hex: &str, ciphertext: &str) -> CryptoResult<Zeroizing<String>>;
}

/// Runs `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> CryptoResult<T>
where
    F: FnOnce() -> CryptoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CryptoError::Unavailable(e.to_string()))?
}

// ============================================================================
// X25519 Engine
// ============================================================================

/// Default [`AsymmetricEngine`]: X25519 + XSalsa20-Poly1305 boxes, private
/// keys protected with Argon2id and AES-256-GCM.
#[derive(Debug, Clone, Default)]
pub struct X25519Engine {
    kdf: KdfParams,
}

impl X25519Engine {
    /// Creates an engine that protects new private keys with `kdf`.
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }
}

#[async_trait]
impl AsymmetricEngine for X25519Engine {
    async fn generate_key_pair(
        &self,
        passphrase: &str,
        identity: &str,
    ) -> CryptoResult<SerializedKeyPair> {
        let passphrase = Zeroizing::new(passphrase.to_string());
        let identity = identity.to_string();
        let kdf = self.kdf;
        blocking(move || asymmetric::generate_key_pair(&passphrase, &identity, &kdf)).await
    }

    async fn decrypt_private_key(
        &self,
        encrypted: &str,
        passphrase: &str,
    ) -> CryptoResult<PrivateKey> {
        let encrypted = encrypted.to_string();
        let passphrase = Zeroizing::new(passphrase.to_string());
        blocking(move || asymmetric::decrypt_private_key(&encrypted, &passphrase)).await
    }

    async fn read_public_key(&self, serialized: &str) -> CryptoResult<PublicKey> {
        asymmetric::read_public_key(serialized)
    }

    async fn encrypt(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        text: &str,
    ) -> CryptoResult<String> {
        let private_key = private_key.clone();
        let public_key = public_key.clone();
        let text = Zeroizing::new(text.to_string());
        blocking(move || asymmetric::seal(&private_key, &public_key, text.as_bytes())).await
    }

    async fn decrypt(
        &self,
        private_key: &PrivateKey,
        public_key: &PublicKey,
        ciphertext: &str,
    ) -> CryptoResult<Zeroizing<String>> {
        let private_key = private_key.clone();
        let public_key = public_key.clone();
        let ciphertext = ciphertext.to_string();
        let bytes =
            blocking(move || asymmetric::open(&private_key, &public_key, &ciphertext)).await?;

        String::from_utf8(bytes.to_vec())
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::InvalidEncoding("boxed text is not valid UTF-8".into()))
    }
}

// ============================================================================
// AES-GCM Engine
// ============================================================================

/// Default [`SymmetricEngine`]: random 256-bit keys, AES-256-GCM payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmEngine;

impl AesGcmEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SymmetricEngine for AesGcmEngine {
    async fn create_encryption_key(&self) -> CryptoResult<SymmetricKey> {
        Ok(SymmetricKey::generate())
    }

    async fn import_key(&self, bytes: &[u8]) -> CryptoResult<SymmetricKey> {
        SymmetricKey::from_bytes(bytes)
    }

    async fn encrypt(&self, key_hex: &str, plaintext: &str) -> CryptoResult<String> {
        let key_hex = Zeroizing::new(key_hex.to_string());
        let plaintext = Zeroizing::new(plaintext.to_string());
        blocking(move || payload::encrypt_text(&key_hex, &plaintext)).await
    }

    async fn decrypt(&self, key_hex: &str, ciphertext: &str) -> CryptoResult<Zeroizing<String>> {
        let key_hex = Zeroizing::new(key_hex.to_string());
        let ciphertext = ciphertext.to_string();
        blocking(move || payload::decrypt_text(&key_hex, &ciphertext)).await
    }
}

/// Hex-encodes raw item key bytes for the wrap boundary.
pub(crate) fn key_to_text(raw_key: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(encoding::bytes_to_hex(raw_key))
}

/// Decodes wrap-boundary hex text back into raw item key bytes.
pub(crate) fn text_to_key(text: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    encoding::hex_to_bytes(text).map(Zeroizing::new)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_x25519_engine_roundtrip() {
        let engine = X25519Engine::new(KdfParams::low_cost());
        let pair = engine.generate_key_pair("pw", "user-1").await.unwrap();

        let private = engine.decrypt_private_key(&pair.private_key, "pw").await.unwrap();
        let public = engine.read_public_key(&pair.public_key).await.unwrap();

        let ciphertext = engine.encrypt(&private, &public, "abc123").await.unwrap();
        let plaintext = engine.decrypt(&private, &public, &ciphertext).await.unwrap();
        assert_eq!(plaintext.as_str(), "abc123");
    }

    #[tokio::test]
    async fn test_x25519_engine_wrong_passphrase() {
        let engine = X25519Engine::new(KdfParams::low_cost());
        let pair = engine.generate_key_pair("pw", "user-1").await.unwrap();

        let result = engine.decrypt_private_key(&pair.private_key, "other").await;
        assert!(matches!(result, Err(CryptoError::PassphraseMismatch)));
    }

    #[tokio::test]
    async fn test_aes_gcm_engine_roundtrip() {
        let engine = AesGcmEngine::new();
        let key = engine.create_encryption_key().await.unwrap();
        let imported = engine.import_key(key.as_bytes()).await.unwrap();
        assert_eq!(key.as_bytes(), imported.as_bytes());

        let ciphertext = engine.encrypt(&key.to_hex(), "payload").await.unwrap();
        let plaintext = engine.decrypt(&imported.to_hex(), &ciphertext).await.unwrap();
        assert_eq!(plaintext.as_str(), "payload");
    }

    #[tokio::test]
    async fn test_aes_gcm_engine_fresh_keys() {
        let engine = AesGcmEngine::new();
        let key1 = engine.create_encryption_key().await.unwrap();
        let key2 = engine.create_encryption_key().await.unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_key_text_roundtrip() {
        let raw = [7u8; 32];
        let text = key_to_text(&raw);
        assert_eq!(text.len(), 64);
        assert_eq!(&text_to_key(&text).unwrap()[..], &raw[..]);
        assert!(text_to_key("xyz").is_err());
    }
}
