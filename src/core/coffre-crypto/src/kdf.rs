//! Key derivation functions.
//!
//! Passphrases are stretched with Argon2id, then expanded with HKDF-SHA256
//! (RFC 5869) into purpose-bound subkeys.

use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::KEY_SIZE;
use crate::error::CryptoError;

/// Size of an Argon2id salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Upper bound on accepted memory cost (KiB), 1 GiB.
const MAX_MEMORY_COST: u32 = 1024 * 1024;

/// Upper bound on accepted iterations.
const MAX_TIME_COST: u32 = 16;

/// Upper bound on accepted lanes.
const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters.
///
/// Stored next to every protected private key, so a key written with one
/// profile still opens after the default profile changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Interactive unlock, 64 MiB.
    pub const fn interactive() -> Self {
        Self {
            memory_cost: 64 * 1024,
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Mobile and constrained devices, 32 MiB.
    pub const fn moderate() -> Self {
        Self {
            memory_cost: 32 * 1024,
            time_cost: 3,
            parallelism: 2,
        }
    }

    /// Long-term keys, 256 MiB.
    pub const fn sensitive() -> Self {
        Self {
            memory_cost: 256 * 1024,
            time_cost: 4,
            parallelism: 4,
        }
    }

    /// Minimal cost. Not suitable for real passphrases; intended for tests.
    pub const fn low_cost() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Checks that the parameters are within accepted bounds.
    ///
    /// Parameters read from a serialized key are untrusted input, so oversized
    /// costs are rejected instead of being run.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.memory_cost > MAX_MEMORY_COST {
            return Err(CryptoError::InvalidInput(format!(
                "memory cost {} KiB exceeds {} KiB",
                self.memory_cost, MAX_MEMORY_COST
            )));
        }
        if self.time_cost == 0 || self.time_cost > MAX_TIME_COST {
            return Err(CryptoError::InvalidInput(format!(
                "time cost must be in 1..={}",
                MAX_TIME_COST
            )));
        }
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(CryptoError::InvalidInput(format!(
                "parallelism must be in 1..={}",
                MAX_PARALLELISM
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Named [`KdfParams`] presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KdfProfile {
    /// See [`KdfParams::interactive`].
    #[default]
    Interactive,
    /// See [`KdfParams::moderate`].
    Moderate,
    /// See [`KdfParams::sensitive`].
    Sensitive,
    /// See [`KdfParams::low_cost`].
    LowCost,
}

impl KdfProfile {
    /// Returns the parameters for this profile.
    pub const fn params(self) -> KdfParams {
        match self {
            Self::Interactive => KdfParams::interactive(),
            Self::Moderate => KdfParams::moderate(),
            Self::Sensitive => KdfParams::sensitive(),
            Self::LowCost => KdfParams::low_cost(),
        }
    }
}

impl std::fmt::Display for KdfProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interactive => write!(f, "interactive"),
            Self::Moderate => write!(f, "moderate"),
            Self::Sensitive => write!(f, "sensitive"),
            Self::LowCost => write!(f, "low-cost"),
        }
    }
}

impl FromStr for KdfProfile {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interactive" => Ok(Self::Interactive),
            "moderate" => Ok(Self::Moderate),
            "sensitive" => Ok(Self::Sensitive),
            "low-cost" => Ok(Self::LowCost),
            _ => Err(CryptoError::InvalidInput(format!("unknown kdf profile: {s}"))),
        }
    }
}

/// Stretches a passphrase into 32 bytes with Argon2id.
pub fn derive_passphrase_key(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::InvalidInput(format!("kdf parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(passphrase, salt, &mut *key)
        .map_err(|e| CryptoError::KeyGenerationFailed(format!("argon2id: {e}")))?;

    Ok(key)
}

/// Expands key material into a 32-byte subkey bound to `info`.
pub fn derive_subkey(ikm: &[u8], info: &[u8]) -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(info, &mut *okm)
        .map_err(|_| CryptoError::KeyGenerationFailed("HKDF expansion failed".to_string()))?;

    Ok(okm)
}
