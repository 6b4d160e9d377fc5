//! Boundary to the platform credential API.
//!
//! Callers hand an [`Authenticator`] creation or request options and get back
//! the attestation or assertion the platform produced. `Ok(None)` mirrors a
//! platform that resolves the ceremony with a null credential.

pub mod types;

use std::future::Future;

pub use types::{
    AssertionResponse, AttestationConveyance, AttestationResponse, CreationOptions,
    ExtensionInputs, ExtensionResults, LargeBlobInputs, LargeBlobOutputs, LargeBlobSupport,
    RelyingParty, RequestOptions, UserEntity,
};

#[derive(Debug, thiserror::Error)]
pub enum CeremonyError {
    #[error("operation not allowed or cancelled")]
    NotAllowed,
    #[error("ceremony timed out")]
    Timeout,
    #[error("credential excluded")]
    CredentialExcluded,
    #[error("another ceremony is pending")]
    Pending,
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    #[error("encoding: {0}")]
    Encoding(String),
    #[error("key: {0}")]
    Key(String),
    #[error("store: {0}")]
    Store(#[from] crate::store::StoreError),
}

impl CeremonyError {
    /// The DOMException name a browser would reject the ceremony with.
    pub fn dom_name(&self) -> &'static str {
        match self {
            Self::NotAllowed => "NotAllowedError",
            Self::Timeout => "TimeoutError",
            Self::CredentialExcluded | Self::Pending => "InvalidStateError",
            Self::NotSupported(_) => "NotSupportedError",
            Self::Encoding(_) => "EncodingError",
            Self::Key(_) | Self::Store(_) => "UnknownError",
        }
    }

    /// True when the user dismissed the prompt or let it expire.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::NotAllowed | Self::Timeout)
    }
}

/// A platform that can run credential ceremonies.
///
/// Ceremonies are user-interactive; implementations may reject a second
/// ceremony while one is still pending.
pub trait Authenticator: Send + Sync {
    fn create(
        &self,
        options: CreationOptions,
    ) -> impl Future<Output = Result<Option<AttestationResponse>, CeremonyError>> + Send;

    fn get(
        &self,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Option<AssertionResponse>, CeremonyError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_name_mapping() {
        assert_eq!(CeremonyError::NotAllowed.dom_name(), "NotAllowedError");
        assert_eq!(CeremonyError::Timeout.dom_name(), "TimeoutError");
        assert_eq!(CeremonyError::CredentialExcluded.dom_name(), "InvalidStateError");
        assert_eq!(CeremonyError::Pending.dom_name(), "InvalidStateError");
        assert_eq!(CeremonyError::NotSupported("x").dom_name(), "NotSupportedError");
        assert_eq!(CeremonyError::Encoding("x".into()).dom_name(), "EncodingError");
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(CeremonyError::NotAllowed.is_cancellation());
        assert!(CeremonyError::Timeout.is_cancellation());
        assert!(!CeremonyError::Pending.is_cancellation());
        assert!(!CeremonyError::NotSupported("largeBlob").is_cancellation());
    }
}
