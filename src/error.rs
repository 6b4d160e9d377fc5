#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("Storage: {0}")]
    Storage(#[from] crate::storage::StorageError),
    #[error("Ceremony: {0}")]
    Ceremony(#[from] crate::webauthn::CeremonyError),
    #[error("Passkey: {0}")]
    Passkey(#[from] crate::passkey::PasskeyError),
    #[error("{0}")]
    Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
