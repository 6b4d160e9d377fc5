//! On-disk layout: `<hex credential id>.bin` holding `nonce || AES-256-GCM(CBOR)`.
//!
//! The credential id is bound as associated data, so a record copied under
//! another id's file name fails to open.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use alloy_primitives::hex;
use rand::RngCore;
use std::path::{Path, PathBuf};

use super::{CredentialRecord, StoreError};

const NONCE_LEN: usize = 12;
const EXTENSION: &str = "bin";

fn credential_path(dir: &Path, credential_id: &[u8]) -> PathBuf {
    dir.join(format!("{}.{EXTENSION}", hex::encode(credential_id)))
}

fn cipher(aes_key: &[u8; 32]) -> Result<Aes256Gcm, StoreError> {
    Aes256Gcm::new_from_slice(aes_key).map_err(|e| StoreError::Encryption(e.to_string()))
}

fn seal(aes_key: &[u8; 32], credential_id: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let sealed = cipher(aes_key)?
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad: credential_id })
        .map_err(|e| StoreError::Encryption(e.to_string()))?;
    Ok([nonce.as_slice(), &sealed].concat())
}

fn open(aes_key: &[u8; 32], credential_id: &[u8], bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
    if bytes.len() < NONCE_LEN {
        return Err(StoreError::Corrupt("file too short".into()));
    }
    let (nonce, sealed) = bytes.split_at(NONCE_LEN);
    cipher(aes_key)?
        .decrypt(Nonce::from_slice(nonce), Payload { msg: sealed, aad: credential_id })
        .map_err(|e| StoreError::Encryption(e.to_string()))
}

/// Seal `record` and atomically replace its file in `dir`.
pub(crate) fn write_credential(
    aes_key: &[u8; 32],
    dir: &Path,
    record: &CredentialRecord,
) -> Result<(), StoreError> {
    let mut cbor = Vec::new();
    ciborium::into_writer(record, &mut cbor)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let sealed = seal(aes_key, &record.credential_id, &cbor)?;

    let path = credential_path(dir, &record.credential_id);
    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, sealed)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

/// Open the record stored at `path`; its file stem names the credential id.
pub(crate) fn read_credential(
    aes_key: &[u8; 32],
    path: &Path,
) -> Result<CredentialRecord, StoreError> {
    let credential_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| hex::decode(s).ok())
        .ok_or_else(|| StoreError::Corrupt("file name is not a hex credential id".into()))?;
    let plaintext = open(aes_key, &credential_id, &std::fs::read(path)?)?;
    let record: CredentialRecord = ciborium::from_reader(plaintext.as_slice())
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    if record.credential_id != credential_id {
        return Err(StoreError::Corrupt("credential id does not match file name".into()));
    }
    Ok(record)
}

pub(crate) fn delete_credential(dir: &Path, credential_id: &[u8]) -> Result<(), StoreError> {
    std::fs::remove_file(credential_path(dir, credential_id))?;
    Ok(())
}

/// Every readable record in `dir`. Unreadable `.bin` files are logged and skipped.
pub(crate) fn load_all(
    aes_key: &[u8; 32],
    dir: &Path,
) -> Result<Vec<CredentialRecord>, StoreError> {
    let mut records = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        match read_credential(aes_key, &path) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable credential file");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_record_bound_to_id() {
        let key = [7u8; 32];
        let sealed = seal(&key, b"id-a", b"payload").unwrap();
        assert_eq!(open(&key, b"id-a", &sealed).unwrap(), b"payload");
        assert!(open(&key, b"id-b", &sealed).is_err());
        assert!(open(&[8u8; 32], b"id-a", &sealed).is_err());
    }

    #[test]
    fn test_short_file_is_corrupt() {
        assert!(matches!(open(&[0u8; 32], b"id", &[1, 2, 3]), Err(StoreError::Corrupt(_))));
    }
}
