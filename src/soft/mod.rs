//! A software platform authenticator.
//!
//! Plays both the browser and the authenticator role behind the
//! [`Authenticator`] trait: it builds collected client data, keeps P-256
//! credentials in a [`CredentialStore`], and implements the `largeBlob`
//! extension with a per-credential blob that each write overwrites.

pub(crate) mod attestation;
pub(crate) mod authenticator_data;
pub(crate) mod client_data;
pub(crate) mod get_assertion;
pub(crate) mod keys;
pub(crate) mod make_credential;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub use authenticator_data::encode_der_ecdsa;

use crate::config::LARGE_BLOB_CAPACITY;
use crate::store::{CredentialStore, StoreError};
use crate::up::UserPresence;
use crate::webauthn::{
    AssertionResponse, AttestationResponse, Authenticator, CeremonyError, CreationOptions,
    RequestOptions,
};

#[derive(Debug, Clone)]
pub struct SoftConfig {
    /// Origin written into collected client data.
    pub origin: String,
    pub presence: UserPresence,
    pub large_blob_support: bool,
    pub large_blob_capacity: usize,
}

impl SoftConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            presence: UserPresence::AutoApprove,
            large_blob_support: true,
            large_blob_capacity: LARGE_BLOB_CAPACITY,
        }
    }

    pub fn with_presence(mut self, presence: UserPresence) -> Self {
        self.presence = presence;
        self
    }

    pub fn without_large_blob(mut self) -> Self {
        self.large_blob_support = false;
        self
    }
}

pub(crate) struct Inner {
    store: Mutex<CredentialStore>,
    config: SoftConfig,
    pending: AtomicBool,
}

impl Inner {
    pub(crate) fn lock_store(&self) -> Result<MutexGuard<'_, CredentialStore>, StoreError> {
        self.store.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Clears the pending flag when the ceremony ends, however it ends.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct SoftAuthenticator {
    inner: Arc<Inner>,
}

impl SoftAuthenticator {
    pub fn new(store: CredentialStore, config: SoftConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                config,
                pending: AtomicBool::new(false),
            }),
        }
    }

    /// An in-memory authenticator that approves every ceremony.
    pub fn ephemeral(origin: impl Into<String>) -> Self {
        Self::new(CredentialStore::in_memory(), SoftConfig::new(origin))
    }

    pub fn config(&self) -> &SoftConfig {
        &self.inner.config
    }

    pub fn credential_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock_store()?.credential_count())
    }

    /// Remove every credential this authenticator holds.
    pub fn wipe(&self) -> Result<usize, StoreError> {
        let mut store = self.inner.lock_store()?;
        let mut removed = 0;
        for id in store.credential_ids() {
            if store.remove(&id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn begin(&self) -> Result<PendingGuard<'_>, CeremonyError> {
        if self.inner.pending.swap(true, Ordering::AcqRel) {
            tracing::warn!("Rejected overlapping ceremony");
            return Err(CeremonyError::Pending);
        }
        Ok(PendingGuard(&self.inner.pending))
    }
}

impl Authenticator for SoftAuthenticator {
    async fn create(
        &self,
        options: CreationOptions,
    ) -> Result<Option<AttestationResponse>, CeremonyError> {
        let _pending = self.begin()?;
        make_credential::handle_make_credential(&self.inner, options)
            .await
            .map(Some)
    }

    async fn get(
        &self,
        options: RequestOptions,
    ) -> Result<Option<AssertionResponse>, CeremonyError> {
        let _pending = self.begin()?;
        get_assertion::handle_get_assertion(&self.inner, options)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webauthn::{RelyingParty, UserEntity};

    fn creation() -> CreationOptions {
        CreationOptions::new(
            vec![1; 32],
            RelyingParty { id: None, name: "Test".into() },
            UserEntity { id: vec![2; 32], name: "u".into(), display_name: "U".into() },
        )
    }

    #[tokio::test]
    async fn test_overlapping_ceremony_is_rejected() {
        let auth = SoftAuthenticator::ephemeral("https://localhost");
        let clone = auth.clone();
        let pending = auth.begin().unwrap();

        let err = clone.create(creation()).await.unwrap_err();
        assert!(matches!(err, CeremonyError::Pending));
        let err = clone.get(RequestOptions::new(vec![0; 32], Vec::new())).await.unwrap_err();
        assert!(matches!(err, CeremonyError::Pending));

        drop(pending);
        assert!(clone.create(creation()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_ceremony_releases_pending_flag() {
        let auth = SoftAuthenticator::ephemeral("https://localhost");
        let mut options = creation();
        options.pub_key_cred_params = vec![-8];
        assert!(matches!(
            auth.create(options).await,
            Err(CeremonyError::NotSupported(_))
        ));
        assert!(auth.create(creation()).await.is_ok());
    }

    #[tokio::test]
    async fn test_wipe_removes_all_credentials() {
        let auth = SoftAuthenticator::ephemeral("https://localhost");
        auth.create(creation()).await.unwrap();
        auth.create(creation()).await.unwrap();
        assert_eq!(auth.credential_count().unwrap(), 2);
        assert_eq!(auth.wipe().unwrap(), 2);
        assert_eq!(auth.credential_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_discoverable_assertion_finds_credential() {
        let auth = SoftAuthenticator::ephemeral("https://localhost");
        let attestation = auth.create(creation()).await.unwrap().unwrap();
        let assertion = auth
            .get(RequestOptions::new(vec![3; 32], Vec::new()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(assertion.raw_id, attestation.raw_id);
        // Sign counter is the last four bytes of authenticator data.
        assert_eq!(&assertion.authenticator_data[33..37], &1u32.to_be_bytes());
    }
}
