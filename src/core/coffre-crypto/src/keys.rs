//! Item key type with automatic memory zeroization.

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::aead::KEY_SIZE;
use crate::encoding::bytes_to_hex;
use crate::error::CryptoError;
use crate::random::generate_key;

/// A 256-bit symmetric key used to encrypt a single item.
///
/// This is the usable handle returned alongside encrypted and decrypted items.
/// The bytes are erased from memory when the handle is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generates a new random key.
    pub fn generate() -> Self {
        let key = generate_key();
        Self { bytes: *key }
    }

    /// Imports a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("expected {} bytes, got {}", KEY_SIZE, bytes.len()))
        })?;

        Ok(Self { bytes })
    }

    /// Returns the raw key bytes.
    ///
    /// Use with caution - the returned slice is not zeroized automatically.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the key as lowercase hex text.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(bytes_to_hex(&self.bytes))
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_key_from_bytes() {
        let bytes = [0x42u8; KEY_SIZE];
        let key = SymmetricKey::from_bytes(&bytes).unwrap();
        assert_eq!(key.as_bytes(), &bytes);
        assert_eq!(key.to_hex().as_str(), "42".repeat(KEY_SIZE));
    }

    #[test]
    fn test_symmetric_key_invalid_length() {
        let result = SymmetricKey::from_bytes(&[0u8; 16]);
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn test_symmetric_key_debug_redacted() {
        let key = SymmetricKey::from_bytes(&[0x42u8; KEY_SIZE]).unwrap();
        let debug_str = format!("{:?}", key);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("42"));
    }

    #[test]
    fn test_keys_are_unique() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }
}
