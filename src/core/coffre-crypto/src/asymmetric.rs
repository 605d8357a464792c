//! X25519 key pairs and authenticated public-key encryption.
//!
//! Key pairs are bound to an identity at generation. The private half only
//! leaves memory passphrase-protected (Argon2id -> HKDF -> AES-256-GCM); the
//! public half is serialized in the clear.
//!
//! Box encryption is X25519 + XSalsa20-Poly1305 with the sender's static
//! secret key, so a box both hides the plaintext and proves it was produced by
//! the holder of that secret. Item keys are boxed from a key pair to itself.

use crypto_box::aead::Aead;
use crypto_box::SalsaBox;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::aead;
use crate::encoding::{bytes_to_hex, frame, hex_to_bytes, unframe};
use crate::error::CryptoError;
use crate::kdf::{derive_passphrase_key, derive_subkey, KdfParams, SALT_SIZE};
use crate::keys::SymmetricKey;
use crate::random::{generate_box_nonce, generate_salt};

/// Size of an X25519 key in bytes.
pub const X25519_KEY_SIZE: usize = 32;

/// Size of an XSalsa20 nonce in bytes.
pub const BOX_NONCE_SIZE: usize = 24;

/// Size of a Poly1305 tag in bytes.
pub const BOX_TAG_SIZE: usize = 16;

/// Maximum identity length in bytes.
pub const MAX_IDENTITY_LEN: usize = 256;

/// HKDF info for the private key wrapping key.
const PRIVATE_KEY_INFO: &[u8] = b"coffre-private-key-v1";

const KIND_PUBLIC: &str = "pk";
const KIND_PRIVATE: &str = "sk";
const KIND_BOX: &str = "box";

// ============================================================================
// Types
// ============================================================================

/// Usable private key. Never serialized except through
/// [`protect_private_key`].
pub struct PrivateKey {
    identity: String,
    secret: crypto_box::SecretKey,
}

impl PrivateKey {
    /// Identity this key was generated for.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            identity: self.identity.clone(),
            key: self.secret.public_key(),
        }
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        let bytes = Zeroizing::new(self.secret.to_bytes());
        Self {
            identity: self.identity.clone(),
            secret: crypto_box::SecretKey::from(*bytes),
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Usable public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    identity: String,
    key: crypto_box::PublicKey,
}

impl PublicKey {
    /// Identity this key was generated for.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Raw X25519 public key.
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        self.key.as_bytes()
    }

    /// First 16 bytes of SHA-256 over the raw key, as hex.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.as_bytes());
        bytes_to_hex(&digest[..16])
    }

    /// Serializes to `coffre:pk:v1:...`.
    pub fn serialize(&self) -> Result<String, CryptoError> {
        let record = PublicKeyRecord {
            identity: self.identity.clone(),
            key: bytes_to_hex(self.key.as_bytes()),
        };
        let json = serde_json::to_vec(&record)
            .map_err(|e| CryptoError::InvalidInput(format!("public key record: {e}")))?;
        Ok(frame(KIND_PUBLIC, &json))
    }
}

/// The two persisted halves of a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedKeyPair {
    /// Passphrase-protected private key (`coffre:sk:v1:...`).
    pub private_key: String,
    /// Public key (`coffre:pk:v1:...`).
    pub public_key: String,
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRecord {
    identity: String,
    key: String,
}

#[derive(Serialize, Deserialize)]
struct ProtectedKeyRecord {
    identity: String,
    public_key: String,
    kdf: KdfParams,
    salt: String,
    ciphertext: String,
}

// ============================================================================
// Identity
// ============================================================================

/// Checks that an identity can be bound into a key pair.
pub fn validate_identity(identity: &str) -> Result<(), CryptoError> {
    if identity.is_empty() {
        return Err(CryptoError::InvalidInput("identity cannot be empty".into()));
    }
    if identity.len() > MAX_IDENTITY_LEN {
        return Err(CryptoError::InvalidInput(format!(
            "identity too long (max {} bytes)",
            MAX_IDENTITY_LEN
        )));
    }
    if identity.chars().any(char::is_control) {
        return Err(CryptoError::InvalidInput(
            "identity cannot contain control characters".into(),
        ));
    }
    Ok(())
}

// ============================================================================
// Key Pair Lifecycle
// ============================================================================

/// Generates a key pair for `identity` and protects the private half with
/// `passphrase`.
pub fn generate_key_pair(
    passphrase: &str,
    identity: &str,
    params: &KdfParams,
) -> Result<SerializedKeyPair, CryptoError> {
    validate_identity(identity)?;

    let private = PrivateKey {
        identity: identity.to_string(),
        secret: crypto_box::SecretKey::generate(&mut OsRng),
    };

    Ok(SerializedKeyPair {
        private_key: protect_private_key(&private, passphrase, params)?,
        public_key: private.public_key().serialize()?,
    })
}

fn private_key_aad(identity: &str, public_key_hex: &str) -> String {
    format!("coffre-sk:v1:{}:{}", identity, public_key_hex)
}

fn wrapping_key(
    passphrase: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<SymmetricKey, CryptoError> {
    let stretched = derive_passphrase_key(passphrase.as_bytes(), salt, params)?;
    let subkey = derive_subkey(&*stretched, PRIVATE_KEY_INFO)?;
    SymmetricKey::from_bytes(&*subkey)
}

/// Serializes a private key under a passphrase (`coffre:sk:v1:...`).
pub fn protect_private_key(
    key: &PrivateKey,
    passphrase: &str,
    params: &KdfParams,
) -> Result<String, CryptoError> {
    let salt = generate_salt();
    let public_key_hex = bytes_to_hex(key.secret.public_key().as_bytes());

    let wrapping = wrapping_key(passphrase, &salt, params)?;
    let secret = Zeroizing::new(key.secret.to_bytes());
    let aad = private_key_aad(&key.identity, &public_key_hex);
    let ciphertext = aead::encrypt(&wrapping, &*secret, aad.as_bytes())?;

    let record = ProtectedKeyRecord {
        identity: key.identity.clone(),
        public_key: public_key_hex,
        kdf: *params,
        salt: bytes_to_hex(&salt),
        ciphertext: bytes_to_hex(&ciphertext),
    };
    let json = serde_json::to_vec(&record)
        .map_err(|e| CryptoError::InvalidInput(format!("private key record: {e}")))?;

    Ok(frame(KIND_PRIVATE, &json))
}

/// Returns the identity a protected private key is bound to, without
/// decrypting it.
pub fn private_key_identity(serialized: &str) -> Result<String, CryptoError> {
    Ok(parse_private_record(serialized)?.identity)
}

fn parse_private_record(serialized: &str) -> Result<ProtectedKeyRecord, CryptoError> {
    let json = unframe(KIND_PRIVATE, serialized)?;
    serde_json::from_slice(&json)
        .map_err(|e| CryptoError::InvalidEncoding(format!("private key record: {e}")))
}

/// Opens a protected private key.
///
/// # Errors
///
/// [`CryptoError::PassphraseMismatch`] if the passphrase does not open the key.
/// AES-GCM cannot distinguish a wrong key from altered data, so a corrupted
/// salt or ciphertext also reports `PassphraseMismatch`. An encoding or key
/// error if the serialization is malformed.
pub fn decrypt_private_key(serialized: &str, passphrase: &str) -> Result<PrivateKey, CryptoError> {
    let record = parse_private_record(serialized)?;
    validate_identity(&record.identity)?;
    record.kdf.validate()?;

    let salt = hex_to_bytes(&record.salt)?;
    if salt.len() != SALT_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "salt must be {} bytes, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }
    let ciphertext = hex_to_bytes(&record.ciphertext)?;

    let wrapping = wrapping_key(passphrase, &salt, &record.kdf)?;
    let aad = private_key_aad(&record.identity, &record.public_key);
    let plaintext = match aead::decrypt(&wrapping, &ciphertext, aad.as_bytes()) {
        Ok(plaintext) => plaintext,
        Err(CryptoError::DecryptionFailed(_)) => return Err(CryptoError::PassphraseMismatch),
        Err(e) => return Err(e),
    };

    let bytes: Zeroizing<[u8; X25519_KEY_SIZE]> =
        Zeroizing::new(plaintext.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                X25519_KEY_SIZE,
                plaintext.len()
            ))
        })?);
    let secret = crypto_box::SecretKey::from(*bytes);

    if bytes_to_hex(secret.public_key().as_bytes()) != record.public_key.to_ascii_lowercase() {
        return Err(CryptoError::InvalidKey(
            "private key does not match its recorded public key".into(),
        ));
    }

    Ok(PrivateKey {
        identity: record.identity,
        secret,
    })
}

/// Imports a serialized public key.
pub fn read_public_key(serialized: &str) -> Result<PublicKey, CryptoError> {
    let json = unframe(KIND_PUBLIC, serialized)?;
    let record: PublicKeyRecord = serde_json::from_slice(&json)
        .map_err(|e| CryptoError::InvalidEncoding(format!("public key record: {e}")))?;
    validate_identity(&record.identity)?;

    let bytes: [u8; X25519_KEY_SIZE] = hex_to_bytes(&record.key)?
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(format!("expected {} bytes", X25519_KEY_SIZE)))?;

    Ok(PublicKey {
        identity: record.identity,
        key: crypto_box::PublicKey::from(bytes),
    })
}

// ============================================================================
// Box Encryption
// ============================================================================

/// Encrypts `plaintext` from `sender` to `recipient` (`coffre:box:v1:...`).
///
/// Format of the framed body: `nonce (24 bytes) || ciphertext || tag (16 bytes)`
pub fn seal(
    sender: &PrivateKey,
    recipient: &PublicKey,
    plaintext: &[u8],
) -> Result<String, CryptoError> {
    let salsa_box = SalsaBox::new(&recipient.key, &sender.secret);

    let nonce = generate_box_nonce();
    let ciphertext = salsa_box
        .encrypt(crypto_box::Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(format!("box seal failed: {e}")))?;

    let mut body = Vec::with_capacity(BOX_NONCE_SIZE + ciphertext.len());
    body.extend_from_slice(&nonce);
    body.extend_from_slice(&ciphertext);

    Ok(frame(KIND_BOX, &body))
}

/// Decrypts a value produced by [`seal`].
pub fn open(
    recipient: &PrivateKey,
    sender: &PublicKey,
    sealed: &str,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let body = unframe(KIND_BOX, sealed)?;
    if body.len() < BOX_NONCE_SIZE + BOX_TAG_SIZE {
        return Err(CryptoError::InvalidInput("box too short".into()));
    }

    let (nonce, ciphertext) = body.split_at(BOX_NONCE_SIZE);
    let salsa_box = SalsaBox::new(&sender.key, &recipient.secret);

    salsa_box
        .decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| {
            CryptoError::DecryptionFailed("box open failed (wrong key or tampered data)".into())
        })
}
