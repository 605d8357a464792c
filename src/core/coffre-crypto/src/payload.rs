//! Item payload encryption keyed by hex text.
//!
//! The item key crosses the wrap boundary as hex, and the payload is keyed by
//! that same hex text, so encryption and decryption always agree on how the
//! key is encoded.

use zeroize::Zeroizing;

use crate::aead;
use crate::encoding::{frame, hex_to_bytes, unframe};
use crate::error::CryptoError;
use crate::keys::SymmetricKey;

/// Associated data bound into every payload ciphertext.
const PAYLOAD_AAD: &[u8] = b"coffre-payload-v1";

const KIND_PAYLOAD: &str = "aead";

fn key_from_hex(key_hex: &str) -> Result<SymmetricKey, CryptoError> {
    let bytes = Zeroizing::new(hex_to_bytes(key_hex)?);
    SymmetricKey::from_bytes(&bytes)
}

/// Encrypts a text payload (`coffre:aead:v1:...`).
pub fn encrypt_text(key_hex: &str, plaintext: &str) -> Result<String, CryptoError> {
    let key = key_from_hex(key_hex)?;
    let ciphertext = aead::encrypt(&key, plaintext.as_bytes(), PAYLOAD_AAD)?;
    Ok(frame(KIND_PAYLOAD, &ciphertext))
}

/// Decrypts a payload produced by [`encrypt_text`].
pub fn decrypt_text(key_hex: &str, ciphertext: &str) -> Result<Zeroizing<String>, CryptoError> {
    let key = key_from_hex(key_hex)?;
    let body = unframe(KIND_PAYLOAD, ciphertext)?;
    let plaintext = aead::decrypt(&key, &body, PAYLOAD_AAD)?;

    // The tag already authenticated these bytes, so this only fails if a
    // non-UTF-8 payload was encrypted by another producer.
    String::from_utf8(plaintext.to_vec())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::InvalidEncoding("payload is not valid UTF-8".into()))
}
