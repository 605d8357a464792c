//! AES-256-GCM authenticated encryption.
//!
//! Used for item payloads and for passphrase protection of private keys.
//! Every call binds associated data so a ciphertext produced for one purpose
//! cannot be replayed as another.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::SymmetricKey;
use crate::random::generate_nonce;

/// Size of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` under `key`.
///
/// Format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`
pub fn encrypt(
    key: &SymmetricKey,
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let nonce_bytes = generate_nonce();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypts data produced by [`encrypt`].
///
/// The plaintext is returned in `Zeroizing` so it is wiped when dropped.
pub fn decrypt(
    key: &SymmetricKey,
    ciphertext: &[u8],
    associated_data: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidInput("ciphertext too short".to_string()));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    let (nonce, encrypted) = ciphertext.split_at(NONCE_SIZE);

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: encrypted,
                aad: associated_data,
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed("authentication failed".to_string()))?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    const AAD: &[u8] = b"coffre-test";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = SymmetricKey::generate();
        let plaintext = b"Hello, Coffre!";

        let ciphertext = encrypt(&key, plaintext, AAD).unwrap();
        let decrypted = decrypt(&key, &ciphertext, AAD).unwrap();

        assert_eq!(&*decrypted, plaintext);
    }

    #[test]
    fn test_ciphertext_format() {
        let key = SymmetricKey::generate();
        let ciphertext = encrypt(&key, b"test", AAD).unwrap();
        assert_eq!(ciphertext.len(), NONCE_SIZE + 4 + TAG_SIZE);
    }

    #[test]
    fn test_decrypt_wrong_aad_fails() {
        let key = SymmetricKey::generate();
        let ciphertext = encrypt(&key, b"secret data", b"correct aad").unwrap();

        let result = decrypt(&key, &ciphertext, b"wrong aad");
        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let ciphertext = encrypt(&SymmetricKey::generate(), b"secret data", AAD).unwrap();
        let result = decrypt(&SymmetricKey::generate(), &ciphertext, AAD);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = SymmetricKey::generate();
        let mut ciphertext = encrypt(&key, b"secret data", AAD).unwrap();
        ciphertext[NONCE_SIZE] ^= 0xFF;

        assert!(decrypt(&key, &ciphertext, AAD).is_err());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = SymmetricKey::generate();
        let result = decrypt(&key, &[0u8; NONCE_SIZE + TAG_SIZE - 1], AAD);
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
    }
}
