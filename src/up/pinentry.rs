use super::prompt::UpPrompt;
use crate::webauthn::CeremonyError;
use std::time::Duration;

/// How the software authenticator confirms user presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPresence {
    /// Every ceremony is approved without prompting. Tests and scripted use.
    AutoApprove,
    /// Every ceremony is rejected as if the user pressed Cancel.
    Deny,
    /// Ask through a pinentry dialog.
    Pinentry { binary: String },
}

pub struct UserPresenceProof {
    pub(crate) _private: (),
}

pub(crate) async fn require_user_presence(
    prompt: &UpPrompt,
    presence: &UserPresence,
    timeout: Duration,
) -> Result<UserPresenceProof, CeremonyError> {
    let bin = match presence {
        UserPresence::AutoApprove => return Ok(UserPresenceProof { _private: () }),
        UserPresence::Deny => return Err(CeremonyError::NotAllowed),
        UserPresence::Pinentry { binary } => binary.clone(),
    };

    let title = prompt.title.clone();
    let description = prompt.description.clone();

    let join = tokio::task::spawn_blocking(move || {
        let input = pinentry::PassphraseInput::with_binary(&bin);
        match input {
            None => Err(pinentry::Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "pinentry binary not found",
            ))),
            Some(mut input) => input
                .with_title(&title)
                .with_description(&description)
                .with_ok("Confirm")
                .with_cancel("Deny")
                .interact(),
        }
    });

    match tokio::time::timeout(timeout, join).await {
        Err(_) => Err(CeremonyError::Timeout),
        Ok(Ok(Ok(_))) => Ok(UserPresenceProof { _private: () }),
        Ok(Ok(Err(e))) => {
            tracing::debug!(error = %e, "pinentry declined");
            Err(CeremonyError::NotAllowed)
        }
        Ok(Err(_)) => Err(CeremonyError::NotAllowed),
    }
}

impl UserPresenceProof {
    /// Construct a proof for use in tests only.
    /// Do not use in production code: this bypasses user presence verification.
    #[doc(hidden)]
    pub fn test_only() -> Self {
        Self { _private: () }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::up::prompt::get_assertion_prompt;

    #[tokio::test]
    async fn test_auto_approve_yields_proof() {
        let prompt = get_assertion_prompt("example.com", None, false);
        let proof = require_user_presence(&prompt, &UserPresence::AutoApprove, Duration::from_secs(1)).await;
        assert!(proof.is_ok());
    }

    #[tokio::test]
    async fn test_deny_is_not_allowed() {
        let prompt = get_assertion_prompt("example.com", None, false);
        let err = require_user_presence(&prompt, &UserPresence::Deny, Duration::from_secs(1))
            .await
            .err()
            .expect("deny must fail");
        assert!(matches!(err, CeremonyError::NotAllowed));
    }
}
