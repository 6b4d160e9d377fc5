//! Client data canonicalization.
//!
//! On-chain WebAuthn verifiers rebuild `clientDataJSON` from the challenge
//! they expect plus the fields that follow it. Those trailing fields are
//! carried byte for byte as hex.

use alloy_primitives::hex;

use super::PasskeyError;

const PREFIX: &str = r#"{"type":"webauthn.get","challenge":""#;
/// Unpadded base64url of a 32-byte challenge.
const CHALLENGE_LEN: usize = 43;

fn is_base64url(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Fields of `clientDataJSON` after the canonical `type` and `challenge`
/// members, as `0x`-prefixed hex of their exact bytes.
pub fn extract_additional_fields(client_data_json: &[u8]) -> Result<String, PasskeyError> {
    let text =
        std::str::from_utf8(client_data_json).map_err(|_| PasskeyError::ChallengeFieldMissing)?;
    let rest = text
        .strip_prefix(PREFIX)
        .ok_or(PasskeyError::ChallengeFieldMissing)?;

    let challenge = rest.as_bytes().get(..CHALLENGE_LEN).ok_or(PasskeyError::ChallengeFieldMissing)?;
    if !challenge.iter().copied().all(is_base64url) {
        return Err(PasskeyError::ChallengeFieldMissing);
    }
    // `challenge` is ASCII, so this slice is on a char boundary.
    let fields = rest[CHALLENGE_LEN..]
        .strip_prefix("\",")
        .and_then(|r| r.strip_suffix('}'))
        .ok_or(PasskeyError::ChallengeFieldMissing)?;
    if fields.chars().any(is_line_terminator) {
        return Err(PasskeyError::ChallengeFieldMissing);
    }
    Ok(hex::encode_prefixed(fields.as_bytes()))
}

/// Rebuild `clientDataJSON` from a base64url challenge and the hex fields
/// produced by [`extract_additional_fields`].
pub fn reconstruct_client_data(
    challenge_b64url: &str,
    fields_hex: &str,
) -> Result<Vec<u8>, PasskeyError> {
    let fields = hex::decode(fields_hex).map_err(|_| PasskeyError::ChallengeFieldMissing)?;
    let mut out = Vec::with_capacity(PREFIX.len() + challenge_b64url.len() + fields.len() + 3);
    out.extend_from_slice(PREFIX.as_bytes());
    out.extend_from_slice(challenge_b64url.as_bytes());
    out.extend_from_slice(b"\",");
    out.extend_from_slice(&fields);
    out.push(b'}');
    Ok(out)
}
