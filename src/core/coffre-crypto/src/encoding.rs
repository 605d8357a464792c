//! Text encodings for key material and ciphertexts.
//!
//! Raw item keys cross text-only interfaces as lowercase hex. Every serialized
//! value Coffre produces is framed as `coffre:{kind}:v1:{base64}` so that a
//! reader can tell a wrapped key from a payload or a key-pair half before
//! attempting any decryption.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::CryptoError;

/// Prefix shared by every framed value.
const FRAME_PREFIX: &str = "coffre";

/// Current framing version.
const FRAME_VERSION: &str = "v1";

/// Encodes bytes as lowercase hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes hex text (either case) into bytes.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(text).map_err(|e| CryptoError::InvalidEncoding(format!("hex: {e}")))
}

/// Frames `data` as `coffre:{kind}:v1:{base64}`.
pub fn frame(kind: &str, data: &[u8]) -> String {
    format!(
        "{}:{}:{}:{}",
        FRAME_PREFIX,
        kind,
        FRAME_VERSION,
        BASE64.encode(data)
    )
}

/// Parses a value produced by [`frame`] and returns its decoded body.
///
/// Fails if the prefix, kind or version differ, or the body is not canonical
/// padded base64.
pub fn unframe(kind: &str, text: &str) -> Result<Vec<u8>, CryptoError> {
    let parts: Vec<&str> = text.splitn(4, ':').collect();

    if parts.len() != 4 || parts[0] != FRAME_PREFIX {
        return Err(CryptoError::InvalidEncoding("not a coffre value".into()));
    }
    if parts[1] != kind {
        return Err(CryptoError::InvalidEncoding(format!(
            "expected {kind} value, got {}",
            parts[1]
        )));
    }
    if parts[2] != FRAME_VERSION {
        return Err(CryptoError::InvalidEncoding(format!(
            "unsupported version {}",
            parts[2]
        )));
    }

    BASE64
        .decode(parts[3])
        .map_err(|e| CryptoError::InvalidEncoding(format!("base64: {e}")))
}
