pub(crate) mod pinentry;
pub(crate) mod prompt;

pub use pinentry::{UserPresence, UserPresenceProof};
pub(crate) use pinentry::require_user_presence;
pub(crate) use prompt::{get_assertion_prompt, make_credential_prompt};
