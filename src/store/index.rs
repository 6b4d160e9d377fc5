use std::collections::HashMap;
use std::path::PathBuf;

use super::{StoreError, credential::CredentialRecord, disk};

struct Backing {
    aes_key: [u8; 32],
    creds_dir: PathBuf,
}

pub struct CredentialStore {
    backing: Option<Backing>,
    by_id: HashMap<[u8; 32], CredentialRecord>,
    by_rp: HashMap<[u8; 32], Vec<[u8; 32]>>,
}

fn index_keys(record: &CredentialRecord) -> Result<([u8; 32], [u8; 32]), StoreError> {
    let id: [u8; 32] = record
        .credential_id
        .as_slice()
        .try_into()
        .map_err(|_| StoreError::Corrupt("credential_id not 32 bytes".into()))?;
    let rp: [u8; 32] = record
        .rp_id_hash
        .as_slice()
        .try_into()
        .map_err(|_| StoreError::Corrupt("rp_id_hash not 32 bytes".into()))?;
    Ok((id, rp))
}

impl CredentialStore {
    /// Load all credentials from disk into memory.
    pub fn load(aes_key: [u8; 32], creds_dir: PathBuf) -> Result<Self, StoreError> {
        let records = disk::load_all(&aes_key, &creds_dir)?;
        let mut store = Self {
            backing: Some(Backing { aes_key, creds_dir }),
            by_id: HashMap::new(),
            by_rp: HashMap::new(),
        };
        for record in records {
            store.index(record)?;
        }
        Ok(store)
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            backing: None,
            by_id: HashMap::new(),
            by_rp: HashMap::new(),
        }
    }

    fn index(&mut self, record: CredentialRecord) -> Result<(), StoreError> {
        let (id, rp) = index_keys(&record)?;
        let ids = self.by_rp.entry(rp).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self.by_id.insert(id, record);
        Ok(())
    }

    fn persist(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if let Some(backing) = &self.backing {
            disk::write_credential(&backing.aes_key, &backing.creds_dir, record)?;
        }
        Ok(())
    }

    /// Add new credential: write to disk and index in memory.
    pub fn add(&mut self, record: CredentialRecord) -> Result<(), StoreError> {
        self.persist(&record)?;
        self.index(record)
    }

    /// Replace an existing credential (sign counter, large blob).
    pub fn update(&mut self, record: CredentialRecord) -> Result<(), StoreError> {
        let (id, _) = index_keys(&record)?;
        if !self.by_id.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        self.persist(&record)?;
        self.by_id.insert(id, record);
        Ok(())
    }

    /// Look up by credential_id (for allowList-based assertions).
    pub fn get_by_id(&self, id: &[u8]) -> Option<&CredentialRecord> {
        let id: [u8; 32] = id.try_into().ok()?;
        self.by_id.get(&id)
    }

    /// Look up all credentials for an rpIdHash (for discoverable/passkey flow).
    /// Returns records sorted by created_at descending (most recent first).
    pub fn get_by_rp_hash(&self, rp_id_hash: &[u8]) -> Vec<&CredentialRecord> {
        let Ok(rp) = <[u8; 32]>::try_from(rp_id_hash) else {
            return Vec::new();
        };
        let Some(ids) = self.by_rp.get(&rp) else {
            return Vec::new();
        };
        let mut records: Vec<&CredentialRecord> =
            ids.iter().filter_map(|id| self.by_id.get(id)).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Remove a credential by id; deletes from disk and memory index.
    pub fn remove(&mut self, id: &[u8]) -> Result<bool, StoreError> {
        let Ok(id) = <[u8; 32]>::try_from(id) else {
            return Ok(false);
        };
        let Some(record) = self.by_id.remove(&id) else {
            return Ok(false);
        };
        if let Some(backing) = &self.backing {
            disk::delete_credential(&backing.creds_dir, &record.credential_id)?;
        }
        let (_, rp) = index_keys(&record)?;
        if let Some(ids) = self.by_rp.get_mut(&rp) {
            ids.retain(|i| i != &id);
            if ids.is_empty() {
                self.by_rp.remove(&rp);
            }
        }
        Ok(true)
    }

    pub fn credential_ids(&self) -> Vec<Vec<u8>> {
        self.by_id.keys().map(|id| id.to_vec()).collect()
    }

    pub fn credential_count(&self) -> usize {
        self.by_id.len()
    }
}
