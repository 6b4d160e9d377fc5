use std::path::PathBuf;
use std::time::Duration;

/// AAGUID reported by the software authenticator.
pub const AAGUID: [u8; 16] = [
    0x5c, 0x8e, 0x21, 0x04, 0x7a, 0x3b, 0x4f, 0x61, 0x9d, 0x02, 0xb4, 0x6e, 0x00, 0x00, 0x00, 0x01,
];

/// COSE algorithm identifier for ECDSA over P-256 with SHA-256.
pub const ES256: i64 = -7;

pub const ENROLLMENT_TIMEOUT: Duration = Duration::from_secs(60);
pub const ASSERTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Bytes of large-blob storage the software authenticator keeps per credential.
pub const LARGE_BLOB_CAPACITY: usize = 1024;

/// Key prefix of the non-authoritative vaulted-address cache.
pub const BLOB_ADDRESS_PREFIX: &str = "blob_pk:";
/// Key under which the enrolled passkey's local storage record lives.
pub const PASSKEY_STORAGE_KEY: &str = "passkeyId";

pub const DEFAULT_RP_NAME: &str = "Recovery Contact";
pub const DEFAULT_USER_NAME: &str = "recovery-contact";
pub const DEFAULT_USER_DISPLAY_NAME: &str = "Recovery Contact";

/// Relying party and user entity used when enrolling a passkey.
#[derive(Debug, Clone)]
pub struct EnrollmentConfig {
    /// Defaults to the effective domain of the caller's origin when unset.
    pub rp_id: Option<String>,
    pub rp_name: String,
    pub user_name: String,
    pub user_display_name: String,
    pub timeout: Duration,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            rp_id: None,
            rp_name: DEFAULT_RP_NAME.to_string(),
            user_name: DEFAULT_USER_NAME.to_string(),
            user_display_name: DEFAULT_USER_DISPLAY_NAME.to_string(),
            timeout: ENROLLMENT_TIMEOUT,
        }
    }
}

/// Chain settings handed to the recovery flow.
///
/// Built once at the binary edge; the library never reads these from the
/// process environment.
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    /// Chain the recovery authorization is issued for.
    pub chain_id: u64,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceMode {
    Approve,
    Deny,
    Pinentry,
}

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "passkey-custody", version)]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Directory holding the authenticator store and local storage file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[arg(long, default_value = "https://localhost", global = true)]
    pub origin: String,
    #[arg(long, value_enum, default_value = "pinentry", global = true)]
    pub presence: PresenceMode,
    #[arg(long, default_value = "pinentry", global = true)]
    pub pinentry: String,
    #[arg(long, env = "PASSKEY_CHAIN_ID", default_value_t = 11155111, global = true)]
    pub chain_id: u64,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a passkey and store its local storage record.
    Enroll,
    /// Generate a secp256k1 key and write it into the passkey's large blob.
    VaultWrite,
    /// Read the vaulted key back from the passkey's large blob.
    VaultRead {
        /// Print the private key instead of only its address.
        #[arg(long)]
        reveal: bool,
    },
    /// Show the locally cached address of the vaulted key (not authoritative).
    CachedAddress,
    /// Sign a recovery hash with the vaulted key.
    Authorize {
        #[arg(long)]
        hash: alloy_primitives::B256,
    },
    /// Sign a hash with the passkey itself and print the WebAuthn signature data.
    PasskeySign {
        #[arg(long)]
        hash: alloy_primitives::B256,
    },
    /// Decode a DER-encoded ECDSA signature into (r, s).
    DecodeSignature { hex: String },
    /// Extract the additional client data fields from hex-encoded clientDataJSON.
    ClientData { hex: String },
    /// Delete all software-authenticator credentials and the local storage file.
    Wipe,
}

impl Config {
    pub fn chain(&self) -> ChainConfig {
        ChainConfig {
            chain_id: self.chain_id,
        }
    }
}
