use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::EncodePublicKey;

use crate::up::UserPresenceProof;
use crate::webauthn::CeremonyError;

/// A freshly generated credential key pair.
pub(crate) struct CredentialKey {
    pub secret: [u8; 32],
    pub x: [u8; 32],
    pub y: [u8; 32],
    /// SubjectPublicKeyInfo DER.
    pub spki: Vec<u8>,
}

pub(crate) fn create_credential_key() -> Result<CredentialKey, CeremonyError> {
    let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
    let verifying_key = signing_key.verifying_key();
    let point = verifying_key.to_encoded_point(false);
    let (Some(x), Some(y)) = (point.x(), point.y()) else {
        return Err(CeremonyError::Key("public key is the identity point".into()));
    };
    let spki = verifying_key
        .to_public_key_der()
        .map_err(|e| CeremonyError::Key(e.to_string()))?
        .as_bytes()
        .to_vec();

    Ok(CredentialKey {
        secret: signing_key.to_bytes().into(),
        x: (*x).into(),
        y: (*y).into(),
        spki,
    })
}

/// Sign `data` (hashed with SHA-256) with the credential's secret scalar.
/// Returns raw (r, s) concatenated, 64 bytes.
/// The `_up` parameter ensures this is only reachable after user presence
/// has been confirmed.
pub(crate) fn sign(
    secret: &[u8],
    data: &[u8],
    _up: &UserPresenceProof,
) -> Result<[u8; 64], CeremonyError> {
    let signing_key =
        SigningKey::from_slice(secret).map_err(|e| CeremonyError::Key(e.to_string()))?;
    let signature: Signature = signing_key.sign(data);
    let mut raw = [0u8; 64];
    raw.copy_from_slice(&signature.to_bytes());
    Ok(raw)
}
