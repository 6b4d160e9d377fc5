//! Passkey-backed key custody.
//!
//! A P-256 passkey is enrolled once and identified by its raw id and public
//! key coordinates. A second, secp256k1 signing key lives inside the
//! passkey's `largeBlob` storage and is only ever in memory for the length of
//! a ceremony. The decoding helpers turn raw authenticator output into the
//! fixed-width values on-chain verifiers expect.

pub mod challenge;
pub mod client_data;
pub mod der;
pub mod enrollment;
pub mod identity;
pub mod signer;
pub mod vault;

pub use challenge::Challenge;
pub use client_data::{extract_additional_fields, reconstruct_client_data};
pub use der::decode_signature;
pub use enrollment::enroll;
pub use identity::{
    CredentialIdentity, LocalStorageRecord, PubkeyCoordinates, is_local_storage_passkey,
    to_local_storage_format,
};
pub use signer::{RecoveryAuthorization, RecoverySigner, WebAuthnSignature};
pub use vault::{BlobVault, VaultedKey};

use crate::storage::StorageError;
use crate::webauthn::CeremonyError;

#[derive(Debug, thiserror::Error)]
pub enum PasskeyError {
    #[error("passkey enrollment failed: {0}")]
    EnrollmentFailed(String),
    #[error("passkey public key export failed: {0}")]
    KeyExportFailed(String),
    #[error("large blob write was not completed")]
    WriteFailed,
    #[error("no vaulted key available")]
    VaultUnavailable,
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(&'static str),
    #[error("challenge field missing from client data")]
    ChallengeFieldMissing,
    #[error("malformed local storage record: {0}")]
    MalformedRecord(String),
    #[error("vaulted key is not a valid secp256k1 scalar")]
    MalformedVaultedKey,
    #[error("ceremony: {0}")]
    Ceremony(#[from] CeremonyError),
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}
