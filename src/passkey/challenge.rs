use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Challenge bound to a single ceremony.
#[derive(Clone, PartialEq, Eq)]
pub struct Challenge(Vec<u8>);

impl Challenge {
    pub const LEN: usize = 32;

    /// Fresh, unpredictable challenge. Use one per ceremony.
    pub fn random() -> Self {
        let mut bytes = vec![0u8; Self::LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }
}

impl From<alloy_primitives::B256> for Challenge {
    fn from(hash: alloy_primitives::B256) -> Self {
        Self(hash.to_vec())
    }
}

impl std::fmt::Debug for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Challenge({})", self.to_base64url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_challenges_differ() {
        let a = Challenge::random();
        let b = Challenge::random();
        assert_eq!(a.as_bytes().len(), Challenge::LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_base64url_of_32_bytes_is_43_chars() {
        let c = Challenge::new([0xffu8; 32]);
        let s = c.to_base64url();
        assert_eq!(s.len(), 43);
        assert!(!s.contains('='));
        assert!(!s.contains('+') && !s.contains('/'));
    }
}
