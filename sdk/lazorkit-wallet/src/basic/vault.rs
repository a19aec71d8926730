use crate::core::storage::KeyValueStore;
use crate::error::{StorageError, VaultError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{keypair_from_seed, Keypair, Signer};
use std::sync::Arc;

/// Persists the session keypair as a JSON array of its 64 bytes
/// (32-byte seed followed by the 32-byte public key).
pub struct KeyVault {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KeyVault {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Storage key this vault owns
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted keypair, if any
    pub fn load(&self) -> Result<Option<Keypair>, VaultError> {
        match self.store.get(&self.key)? {
            Some(encoded) => decode_keypair(&encoded).map(Some),
            None => Ok(None),
        }
    }

    pub fn save(&self, keypair: &Keypair) -> Result<(), StorageError> {
        self.store.set(&self.key, &encode_keypair(keypair)?)
    }

    pub fn erase(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault").field("key", &self.key).finish()
    }
}

fn encode_keypair(keypair: &Keypair) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&keypair.to_bytes().to_vec())?)
}

fn decode_keypair(encoded: &str) -> Result<Keypair, VaultError> {
    let bytes: Vec<u8> =
        serde_json::from_str(encoded).map_err(|e| VaultError::Corrupt(e.to_string()))?;
    if bytes.len() != 64 {
        return Err(VaultError::Corrupt(format!(
            "expected 64 bytes, found {}",
            bytes.len()
        )));
    }

    let keypair =
        keypair_from_seed(&bytes[..32]).map_err(|e| VaultError::Corrupt(e.to_string()))?;
    let stored_pubkey =
        Pubkey::try_from(&bytes[32..]).map_err(|e| VaultError::Corrupt(e.to_string()))?;
    if keypair.pubkey() != stored_pubkey {
        return Err(VaultError::Corrupt(
            "public key does not match secret".to_string(),
        ));
    }

    Ok(keypair)
}
