pub mod config;
pub mod diagnostics;
pub mod error;
pub mod passkey;
pub mod soft;
pub mod storage;
pub mod store;
pub(crate) mod up;
pub mod webauthn;

use std::path::{Path, PathBuf};

use alloy_primitives::hex;
use serde_json::json;

use config::{Command, Config, EnrollmentConfig, PASSKEY_STORAGE_KEY, PresenceMode};
use passkey::{BlobVault, Challenge, CredentialIdentity, LocalStorageRecord, RecoverySigner};
use soft::{SoftAuthenticator, SoftConfig};
use storage::{FileStore, KeyValueStore};

pub use error::{Error, Result};
pub use up::{UserPresence, UserPresenceProof};

const STORE_KEY_FILE: &str = "store.key";
const CREDENTIALS_DIR: &str = "credentials";
const LOCAL_STORAGE_FILE: &str = "local.json";

pub fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();
}

fn data_dir(cfg: &Config) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &cfg.data_dir {
        return Ok(dir.clone());
    }
    Ok(directories::ProjectDirs::from("", "", "passkey-custody")
        .ok_or_else(|| anyhow::anyhow!("cannot determine XDG data dir"))?
        .data_dir()
        .to_path_buf())
}

fn user_presence(cfg: &Config) -> UserPresence {
    match cfg.presence {
        PresenceMode::Approve => UserPresence::AutoApprove,
        PresenceMode::Deny => UserPresence::Deny,
        PresenceMode::Pinentry => UserPresence::Pinentry {
            binary: cfg.pinentry.clone(),
        },
    }
}

/// Read the AES key sealing the credential store, creating it on first use.
pub fn load_or_create_store_key(path: &Path) -> Result<[u8; 32]> {
    if path.exists() {
        let bytes = std::fs::read(path)?;
        return bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::Internal(format!("{} is not 32 bytes", path.display())));
    }

    let mut key = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut key);
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
    std::io::Write::write_all(&mut options.open(path)?, &key)?;
    Ok(key)
}

/// The enrolled passkey recorded in local storage.
pub fn load_identity(storage: &impl KeyValueStore) -> Result<CredentialIdentity> {
    let text = storage.get_item(PASSKEY_STORAGE_KEY)?.ok_or_else(|| {
        Error::Internal("no passkey enrolled; run `passkey-custody enroll` first".into())
    })?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(LocalStorageRecord::from_value(value)?.to_identity()?)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn wipe(data_dir: &Path) -> anyhow::Result<()> {
    let key_path = data_dir.join(STORE_KEY_FILE);
    let creds_dir = data_dir.join(CREDENTIALS_DIR);
    let mut count = 0usize;
    if key_path.exists() && creds_dir.exists() {
        let aes_key = load_or_create_store_key(&key_path)?;
        let store = store::CredentialStore::load(aes_key, creds_dir.clone())
            .map_err(|e| anyhow::anyhow!("Failed to load credential store: {e}"))?;
        count = SoftAuthenticator::new(store, SoftConfig::new("")).wipe()?;
    }
    println!("Deleted {count} credential(s) from {}", creds_dir.display());

    let local = data_dir.join(LOCAL_STORAGE_FILE);
    if local.exists() {
        std::fs::remove_file(&local)?;
        println!("Deleted local storage {}", local.display());
    }
    Ok(())
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    // Pure decoders need neither the authenticator nor the lock.
    match &cfg.command {
        Command::DecodeSignature { hex: input } => {
            let (r, s) = passkey::decode_signature(&hex::decode(input.trim())?)?;
            return print_json(&json!({ "r": r, "s": s }));
        }
        Command::ClientData { hex: input } => {
            let fields = passkey::extract_additional_fields(&hex::decode(input.trim())?)?;
            return print_json(&json!({ "clientDataFields": fields }));
        }
        _ => {}
    }

    tracing::info!("Starting passkey-custody");

    let data_dir = data_dir(&cfg)?;

    // Preflight checks
    diagnostics::check(&cfg, &data_dir)?;

    // Single-instance lock: one ceremony at a time across processes
    let lock_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.clone());
    let lock_path = lock_dir.join("passkey-custody.lock");
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _guard = lock.try_write().map_err(|_| {
        anyhow::anyhow!(
            "passkey-custody is already running (lock: {})",
            lock_path.display()
        )
    })?;

    if matches!(cfg.command, Command::Wipe) {
        return wipe(&data_dir);
    }

    let aes_key = load_or_create_store_key(&data_dir.join(STORE_KEY_FILE))?;
    tracing::info!("Store key ready");

    let creds_dir = data_dir.join(CREDENTIALS_DIR);
    std::fs::create_dir_all(&creds_dir)?;
    let store = store::CredentialStore::load(aes_key, creds_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load credential store: {e}"))?;
    tracing::info!(count = store.credential_count(), "Credential store loaded");

    let authenticator = SoftAuthenticator::new(
        store,
        SoftConfig::new(cfg.origin.clone()).with_presence(user_presence(&cfg)),
    );
    let storage = FileStore::open(data_dir.join(LOCAL_STORAGE_FILE))?;
    let signer = RecoverySigner::new(BlobVault::new(authenticator, storage), cfg.chain());
    let vault = signer.vault();

    match cfg.command {
        Command::Enroll => {
            let identity = passkey::enroll(
                vault.authenticator(),
                &EnrollmentConfig::default(),
                &Challenge::random(),
            )
            .await?;
            let record = passkey::to_local_storage_format(&identity);
            vault
                .storage()
                .set_item(PASSKEY_STORAGE_KEY, &serde_json::to_string(&record)?)?;
            print_json(&serde_json::to_value(&record)?)
        }
        Command::VaultWrite => {
            let identity = load_identity(vault.storage())?;
            let address = vault.write(&identity, &Challenge::random()).await?;
            print_json(&json!({ "address": address }))
        }
        Command::VaultRead { reveal } => {
            let identity = load_identity(vault.storage())?;
            match vault.read(&identity, &Challenge::random()).await? {
                Some(key) if reveal => print_json(&json!({
                    "address": key.address()?,
                    "privateKey": key.to_hex(),
                })),
                Some(key) => print_json(&json!({ "address": key.address()? })),
                None => {
                    println!("No vaulted key available");
                    Ok(())
                }
            }
        }
        Command::CachedAddress => {
            let identity = load_identity(vault.storage())?;
            match vault.cached_address(&identity)? {
                Some(address) => print_json(&json!({ "address": address, "authoritative": false })),
                None => {
                    println!("No cached address");
                    Ok(())
                }
            }
        }
        Command::Authorize { hash } => {
            let identity = load_identity(vault.storage())?;
            let auth = signer.authorize(&identity, hash, &Challenge::random()).await?;
            print_json(&json!({
                "chainId": auth.chain_id,
                "signer": auth.signer,
                "hash": auth.hash,
                "signature": hex::encode_prefixed(auth.signature.as_bytes()),
            }))
        }
        Command::PasskeySign { hash } => {
            let identity = load_identity(vault.storage())?;
            let sig = signer.sign_with_passkey(&identity, hash).await?;
            let verified = sig.verify(&identity.pubkey_coordinates, &hash);
            print_json(&json!({
                "authenticatorData": sig.authenticator_data,
                "clientDataFields": sig.client_data_fields,
                "r": sig.r,
                "s": sig.s,
                "verified": verified,
            }))
        }
        Command::DecodeSignature { .. } | Command::ClientData { .. } | Command::Wipe => Ok(()),
    }
}
