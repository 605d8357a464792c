//! Keyring file: the identity and its exported key pair, as JSON.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use coffre_envelope::MasterKeys;
use serde::{Deserialize, Serialize};

/// On-disk keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyring {
    /// Identity the key pair is bound to.
    pub identity: String,
    /// Serialized key pair, as exported by the manager.
    pub master_keys: MasterKeys,
}

impl Keyring {
    pub fn new(identity: impl Into<String>, master_keys: MasterKeys) -> Self {
        Self {
            identity: identity.into(),
            master_keys,
        }
    }

    /// Reads a keyring file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyring {}", path.display()))?;
        let keyring: Self = serde_json::from_str(&data)
            .with_context(|| format!("Malformed keyring {}", path.display()))?;

        if keyring.master_keys.private_key.is_empty() || keyring.master_keys.public_key.is_empty() {
            bail!("Keyring {} holds no key pair", path.display());
        }

        Ok(keyring)
    }

    /// Writes the keyring, refusing to replace an existing file unless `force`.
    pub fn write(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "Keyring {} already exists. Use --force to overwrite",
                path.display()
            );
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize keyring")?;
        fs::write(path, data)
            .with_context(|| format!("Failed to write keyring {}", path.display()))
    }
}
