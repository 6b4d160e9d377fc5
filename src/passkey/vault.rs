//! A secp256k1 signing key vaulted in a passkey's `largeBlob` storage.
//!
//! The authenticator's blob is the only authoritative copy of the key. The
//! address kept in local storage under `blob_pk:<rawId>` is a display hint
//! and says nothing about whether a key is actually vaulted.

use alloy_primitives::{Address, hex};
use k256::ecdsa::SigningKey;

use super::{Challenge, CredentialIdentity, PasskeyError};
use crate::config::BLOB_ADDRESS_PREFIX;
use crate::storage::KeyValueStore;
use crate::webauthn::{
    AssertionResponse, Authenticator, CeremonyError, LargeBlobInputs, RequestOptions,
};

/// Key bytes read back from a passkey's large blob.
#[derive(Clone, PartialEq, Eq)]
pub struct VaultedKey(Vec<u8>);

impl VaultedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `0x`-prefixed hex of the raw key bytes.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }

    pub fn signing_key(&self) -> Result<SigningKey, PasskeyError> {
        SigningKey::from_slice(&self.0).map_err(|_| PasskeyError::MalformedVaultedKey)
    }

    pub fn address(&self) -> Result<Address, PasskeyError> {
        Ok(address_of(&self.signing_key()?))
    }
}

impl std::fmt::Debug for VaultedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VaultedKey([REDACTED; {}])", self.0.len())
    }
}

pub(crate) fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    Address::from_raw_public_key(&point.as_bytes()[1..])
}

pub struct BlobVault<A, S> {
    authenticator: A,
    storage: S,
}

impl<A: Authenticator, S: KeyValueStore> BlobVault<A, S> {
    pub fn new(authenticator: A, storage: S) -> Self {
        Self {
            authenticator,
            storage,
        }
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn cache_key(identity: &CredentialIdentity) -> String {
        format!("{BLOB_ADDRESS_PREFIX}{}", identity.raw_id_hex())
    }

    /// Address recorded by the last successful write on this machine.
    ///
    /// Not authoritative: use [`BlobVault::read`] to learn whether a key is
    /// actually vaulted.
    pub fn cached_address(
        &self,
        identity: &CredentialIdentity,
    ) -> Result<Option<Address>, PasskeyError> {
        let Some(value) = self.storage.get_item(&Self::cache_key(identity))? else {
            return Ok(None);
        };
        match value.parse() {
            Ok(address) => Ok(Some(address)),
            Err(_) => {
                tracing::warn!(value = %value, "Ignoring unparsable cached address");
                Ok(None)
            }
        }
    }

    /// Run an assertion scoped to `options`, bounded by its timeout.
    pub(crate) async fn assertion(
        &self,
        options: RequestOptions,
    ) -> Result<Option<AssertionResponse>, CeremonyError> {
        let timeout = options.timeout;
        tokio::time::timeout(timeout, self.authenticator.get(options))
            .await
            .unwrap_or(Err(CeremonyError::Timeout))
    }

    /// Generate a fresh secp256k1 key and write it into the passkey's large
    /// blob, overwriting any key already there.
    ///
    /// The key is dropped if the authenticator does not confirm the write.
    pub async fn write(
        &self,
        identity: &CredentialIdentity,
        challenge: &Challenge,
    ) -> Result<Address, PasskeyError> {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        let address = address_of(&key);
        let options = RequestOptions::new(challenge.as_bytes().to_vec(), vec![identity.raw_id.clone()])
            .with_large_blob(LargeBlobInputs {
                write: Some(key.to_bytes().to_vec()),
                ..LargeBlobInputs::default()
            });

        let assertion = match self.assertion(options).await {
            Ok(Some(assertion)) => assertion,
            Ok(None) => return Err(PasskeyError::WriteFailed),
            Err(e) if e.is_cancellation() => {
                tracing::info!(error = %e, "Large blob write cancelled");
                return Err(PasskeyError::WriteFailed);
            }
            Err(e) => return Err(e.into()),
        };

        let written = assertion
            .extension_results
            .large_blob
            .and_then(|lb| lb.written)
            .unwrap_or(false);
        if !written {
            tracing::warn!(raw_id = %identity.raw_id_hex(), "Authenticator did not write the large blob");
            return Err(PasskeyError::WriteFailed);
        }

        // The blob now holds the key; a failed cache update must not hide that.
        if let Err(e) = self
            .storage
            .set_item(&Self::cache_key(identity), &address.to_checksum(None))
        {
            tracing::warn!(raw_id = %identity.raw_id_hex(), error = %e, "Failed to cache vaulted address");
        }
        tracing::info!(raw_id = %identity.raw_id_hex(), %address, "Key vaulted");
        Ok(address)
    }

    /// Read the vaulted key back.
    ///
    /// `Ok(None)` means no key is available right now: the user dismissed
    /// the prompt, the authenticator returned nothing, or nothing was ever
    /// written.
    pub async fn read(
        &self,
        identity: &CredentialIdentity,
        challenge: &Challenge,
    ) -> Result<Option<VaultedKey>, PasskeyError> {
        let options = RequestOptions::new(challenge.as_bytes().to_vec(), vec![identity.raw_id.clone()])
            .with_large_blob(LargeBlobInputs {
                read: true,
                ..LargeBlobInputs::default()
            });

        let assertion = match self.assertion(options).await {
            Ok(Some(assertion)) => assertion,
            Ok(None) => return Ok(None),
            Err(e) if e.is_cancellation() => {
                tracing::info!(error = %e, "Large blob read cancelled");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(outputs) = assertion.extension_results.large_blob else {
            tracing::warn!(raw_id = %identity.raw_id_hex(), "Could not read blob: largeBlob result missing");
            return Ok(None);
        };
        match outputs.blob {
            Some(blob) if !blob.is_empty() => Ok(Some(VaultedKey(blob))),
            _ => {
                tracing::debug!(raw_id = %identity.raw_id_hex(), "No blob stored for credential");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vaulted_key_debug_is_redacted() {
        let key = VaultedKey(vec![0x11; 32]);
        let debug = format!("{key:?}");
        assert!(!debug.contains("11"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_vaulted_key_address_matches_generated() {
        let signing = SigningKey::random(&mut rand::rngs::OsRng);
        let key = VaultedKey(signing.to_bytes().to_vec());
        assert_eq!(key.address().unwrap(), address_of(&signing));
        assert_eq!(key.to_hex().len(), 66);
    }

    #[test]
    fn test_zero_key_is_malformed() {
        let key = VaultedKey(vec![0u8; 32]);
        assert!(matches!(key.signing_key(), Err(PasskeyError::MalformedVaultedKey)));
        assert!(VaultedKey(vec![1, 2, 3]).signing_key().is_err());
    }

    #[test]
    fn test_known_address() {
        // Private key 1 maps to the generator point.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let key = VaultedKey(bytes.to_vec());
        assert_eq!(
            key.address().unwrap(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse::<Address>().unwrap()
        );
    }
}
