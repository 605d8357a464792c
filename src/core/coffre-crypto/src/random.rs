//! Cryptographically secure random generation.
//!
//! Every random value in Coffre comes from the operating system CSPRNG.

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::aead::{KEY_SIZE, NONCE_SIZE};
use crate::asymmetric::BOX_NONCE_SIZE;
use crate::kdf::SALT_SIZE;

/// Generates a random 256-bit key wrapped in `Zeroizing`.
pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut *key);
    key
}

/// Generates a random 96-bit AES-GCM nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generates a random 192-bit XSalsa20 nonce for box encryption.
pub fn generate_box_nonce() -> [u8; BOX_NONCE_SIZE] {
    let mut nonce = [0u8; BOX_NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generates a random Argon2id salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_key_unique() {
        let key1 = generate_key();
        let key2 = generate_key();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn test_nonce_sizes() {
        assert_eq!(generate_nonce().len(), NONCE_SIZE);
        assert_eq!(generate_box_nonce().len(), BOX_NONCE_SIZE);
        assert_eq!(generate_salt().len(), SALT_SIZE);
    }

    #[test]
    fn test_box_nonces_do_not_repeat() {
        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_box_nonce()), "duplicate nonce generated");
        }
    }
}
