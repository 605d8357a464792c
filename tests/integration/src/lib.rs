//! Integration tests for Coffre.
//!
//! These tests persist key pairs and items through a file-backed store and
//! reopen them with fresh managers, the way a host application would.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use coffre_envelope::{EnvelopeConfig, EnvelopeManager, KdfProfile, MasterKeys, StoredItem};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

// ============================================================================
// Test Store
// ============================================================================

/// Everything a host application persists for one identity.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreFile {
    pub identity: String,
    pub master_keys: MasterKeys,
    pub items: HashMap<String, StoredItem>,
}

/// A store that manages its own data directory.
pub struct TestStore {
    path: PathBuf,
    _data_dir: TempDir,
}

impl TestStore {
    pub fn new() -> Result<Self> {
        let data_dir = TempDir::new().context("Failed to create temp dir")?;
        let path = data_dir.path().join("store.json");
        Ok(Self {
            path,
            _data_dir: data_dir,
        })
    }

    pub fn read(&self) -> Result<StoreFile> {
        let data = fs::read_to_string(&self.path).context("Failed to read store")?;
        serde_json::from_str(&data).context("Malformed store")
    }

    pub fn write(&self, store: &StoreFile) -> Result<()> {
        let data = serde_json::to_string_pretty(store)?;
        fs::write(&self.path, data).context("Failed to write store")
    }

    /// Provisions a key pair and persists it.
    pub async fn provision(&self, identity: &str, passphrase: &str) -> Result<EnvelopeManager> {
        let manager = test_manager(identity, passphrase).provision().await?;
        self.write(&StoreFile {
            identity: identity.to_string(),
            master_keys: manager.export_master_keys(),
            items: HashMap::new(),
        })?;
        Ok(manager)
    }

    /// Reopens the persisted key pair with a fresh manager.
    pub async fn open(&self, passphrase: &str) -> Result<EnvelopeManager> {
        let store = self.read()?;
        let manager = test_manager(&store.identity, passphrase)
            .load(&store.master_keys.private_key, &store.master_keys.public_key)
            .await?;
        Ok(manager)
    }

    pub async fn put(&self, manager: &EnvelopeManager, name: &str, value: &str) -> Result<()> {
        let item = manager.encrypt(value).await?;
        let mut store = self.read()?;
        store.items.insert(name.to_string(), item.stored());
        self.write(&store)
    }

    pub async fn get(&self, manager: &EnvelopeManager, name: &str) -> Result<String> {
        let store = self.read()?;
        let item = store.items.get(name).context("No such item")?;
        let plain = manager.decrypt_stored(item).await?;
        Ok(plain.value.to_string())
    }
}

/// Manager with cheap Argon2id parameters.
pub fn test_manager(identity: &str, passphrase: &str) -> EnvelopeManager {
    EnvelopeManager::with_config(
        identity,
        passphrase,
        EnvelopeConfig::with_profile(KdfProfile::LowCost),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use coffre_envelope::{EnvelopeError, KeyStatus};

    #[tokio::test]
    async fn test_complete_lifecycle() {
        let store = TestStore::new().unwrap();

        // 1. Provision and store an item
        let manager = store.provision("user-1", "correct-horse").await.unwrap();
        assert_eq!(manager.status(), KeyStatus::Ready);
        store.put(&manager, "greeting", "hello world").await.unwrap();
        let fingerprint = manager.fingerprint();
        drop(manager);

        // 2. Reopen from disk
        let manager = store.open("correct-horse").await.unwrap();
        assert_eq!(manager.fingerprint(), fingerprint);
        assert_eq!(store.get(&manager, "greeting").await.unwrap(), "hello world");

        // 3. Reopened manager exports what was stored
        assert_eq!(manager.export_master_keys(), store.read().unwrap().master_keys);

        // 4. Items written after reopening are readable too
        store.put(&manager, "second", "another value").await.unwrap();
        let manager = store.open("correct-horse").await.unwrap();
        assert_eq!(store.get(&manager, "second").await.unwrap(), "another value");
        assert_eq!(store.get(&manager, "greeting").await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_wrong_passphrase_on_reopen() {
        let store = TestStore::new().unwrap();
        store.provision("user-1", "correct-horse").await.unwrap();

        let err = store.open("battery-staple").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnvelopeError>(),
            Some(EnvelopeError::PassphraseMismatch)
        ));
    }

    #[tokio::test]
    async fn test_tampered_store_rejected() {
        let store = TestStore::new().unwrap();
        let manager = store.provision("user-1", "pw").await.unwrap();
        store.put(&manager, "a", "first").await.unwrap();
        store.put(&manager, "b", "second").await.unwrap();

        // Swap the ciphertexts between the two items
        let mut file = store.read().unwrap();
        let a = file.items["a"].clone();
        let b = file.items["b"].clone();
        file.items.insert(
            "a".into(),
            StoredItem {
                encrypted_key: a.encrypted_key,
                encrypted_value: b.encrypted_value,
            },
        );
        store.write(&file).unwrap();

        let err = store.get(&manager, "a").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnvelopeError>(),
            Some(EnvelopeError::PayloadDecryptionFailure(_))
        ));
        assert_eq!(store.get(&manager, "b").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let alice_store = TestStore::new().unwrap();
        let bob_store = TestStore::new().unwrap();
        let alice = alice_store.provision("alice", "alice-pw").await.unwrap();
        let bob = bob_store.provision("bob", "bob-pw").await.unwrap();

        alice_store.put(&alice, "note", "alice's note").await.unwrap();

        let err = alice_store.get(&bob, "note").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnvelopeError>(),
            Some(EnvelopeError::UnwrapFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_swapped_key_pair_files_rejected() {
        let alice_store = TestStore::new().unwrap();
        let bob_store = TestStore::new().unwrap();
        alice_store.provision("alice", "pw").await.unwrap();
        bob_store.provision("bob", "pw").await.unwrap();

        // Alice's private key with Bob's public key
        let mut file = alice_store.read().unwrap();
        file.master_keys.public_key = bob_store.read().unwrap().master_keys.public_key;
        alice_store.write(&file).unwrap();

        let err = alice_store.open("pw").await.unwrap_err();
        assert!(err.downcast_ref::<EnvelopeError>().is_some());
    }

    #[tokio::test]
    async fn test_shared_manager_across_tasks() {
        let store = TestStore::new().unwrap();
        let manager = Arc::new(store.provision("user-1", "pw").await.unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let value = format!("value-{i}");
                    let item = manager.encrypt(&value).await.unwrap();
                    (value, item.stored())
                })
            })
            .collect();

        let mut items = Vec::new();
        for handle in handles {
            items.push(handle.await.unwrap());
        }

        // Decrypt with a manager reopened from disk
        let reopened = store.open("pw").await.unwrap();
        for (value, item) in &items {
            let plain = reopened.decrypt_stored(item).await.unwrap();
            assert_eq!(plain.value.as_str(), value);
        }
    }

    #[tokio::test]
    async fn test_stored_item_json_shape() {
        let store = TestStore::new().unwrap();
        let manager = store.provision("user-1", "pw").await.unwrap();
        store.put(&manager, "x", "value").await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&store.path).unwrap()).unwrap();
        let item = &raw["items"]["x"];
        assert!(item["encrypted_key"].as_str().unwrap().starts_with("coffre:box:v1:"));
        assert!(item["encrypted_value"].as_str().unwrap().starts_with("coffre:aead:v1:"));
        assert!(raw["master_keys"]["private_key"]
            .as_str()
            .unwrap()
            .starts_with("coffre:sk:v1:"));
        assert!(raw["master_keys"]["public_key"]
            .as_str()
            .unwrap()
            .starts_with("coffre:pk:v1:"));
    }

    #[tokio::test]
    async fn test_public_key_readable_without_passphrase() {
        let store = TestStore::new().unwrap();
        let manager = store.provision("user-1", "pw").await.unwrap();

        let file = store.read().unwrap();
        let public = coffre_crypto::asymmetric::read_public_key(&file.master_keys.public_key)
            .unwrap();
        assert_eq!(public.identity(), "user-1");
        assert_eq!(Some(public.fingerprint()), manager.fingerprint());
    }
}
