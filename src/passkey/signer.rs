use alloy_primitives::{Address, B256, Bytes, Signature, U256};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::signature::Verifier as _;
use sha2::{Digest, Sha256};

use super::vault::{BlobVault, address_of};
use super::{
    Challenge, CredentialIdentity, PasskeyError, PubkeyCoordinates, decode_signature,
    extract_additional_fields, reconstruct_client_data,
};
use crate::config::ChainConfig;
use crate::storage::KeyValueStore;
use crate::webauthn::{Authenticator, CeremonyError, RequestOptions};

/// A recovery hash signed with the vaulted secp256k1 key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryAuthorization {
    pub chain_id: u64,
    pub signer: Address,
    pub hash: B256,
    pub signature: Signature,
}

impl RecoveryAuthorization {
    /// Recover the signing address from `signature` and `hash`.
    pub fn recover_signer(&self) -> Option<Address> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.signature.r().to_be_bytes::<32>());
        rs[32..].copy_from_slice(&self.signature.s().to_be_bytes::<32>());
        let sig = k256::ecdsa::Signature::from_slice(&rs).ok()?;
        let recid = k256::ecdsa::RecoveryId::new(self.signature.v(), false);
        let key =
            k256::ecdsa::VerifyingKey::recover_from_prehash(self.hash.as_slice(), &sig, recid)
                .ok()?;
        let point = key.to_encoded_point(false);
        Some(Address::from_raw_public_key(&point.as_bytes()[1..]))
    }
}

/// Passkey signature data in the form on-chain WebAuthn verifiers take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnSignature {
    pub authenticator_data: Bytes,
    /// Hex of the client data fields after `challenge`.
    pub client_data_fields: String,
    pub r: U256,
    pub s: U256,
}

impl WebAuthnSignature {
    pub fn from_assertion(
        authenticator_data: &[u8],
        client_data_json: &[u8],
        der_signature: &[u8],
    ) -> Result<Self, PasskeyError> {
        let (r, s) = decode_signature(der_signature)?;
        let client_data_fields = extract_additional_fields(client_data_json)?;
        Ok(Self {
            authenticator_data: Bytes::copy_from_slice(authenticator_data),
            client_data_fields,
            r,
            s,
        })
    }

    /// Check the signature against `coordinates` for a challenge of `hash`,
    /// rebuilding client data the way a contract verifier does.
    pub fn verify(&self, coordinates: &PubkeyCoordinates, hash: &B256) -> bool {
        let Ok(client_data) =
            reconstruct_client_data(&URL_SAFE_NO_PAD.encode(hash), &self.client_data_fields)
        else {
            return false;
        };
        let Ok(key) = p256::ecdsa::VerifyingKey::from_sec1_bytes(&coordinates.to_sec1_uncompressed())
        else {
            return false;
        };
        let Ok(signature) = p256::ecdsa::Signature::from_scalars(
            self.r.to_be_bytes::<32>(),
            self.s.to_be_bytes::<32>(),
        ) else {
            return false;
        };

        let mut signed_data = Vec::with_capacity(self.authenticator_data.len() + 32);
        signed_data.extend_from_slice(&self.authenticator_data);
        signed_data.extend_from_slice(&Sha256::digest(&client_data));
        key.verify(&signed_data, &signature).is_ok()
    }
}

/// Produces recovery authorizations for an enrolled passkey.
pub struct RecoverySigner<A, S> {
    vault: BlobVault<A, S>,
    chain: ChainConfig,
}

impl<A: Authenticator, S: KeyValueStore> RecoverySigner<A, S> {
    pub fn new(vault: BlobVault<A, S>, chain: ChainConfig) -> Self {
        Self { vault, chain }
    }

    pub fn vault(&self) -> &BlobVault<A, S> {
        &self.vault
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Read the vaulted key and sign `hash` with it.
    ///
    /// Fails with [`PasskeyError::VaultUnavailable`] when the read ceremony
    /// yields no key.
    pub async fn authorize(
        &self,
        identity: &CredentialIdentity,
        hash: B256,
        challenge: &Challenge,
    ) -> Result<RecoveryAuthorization, PasskeyError> {
        let key = self
            .vault
            .read(identity, challenge)
            .await?
            .ok_or(PasskeyError::VaultUnavailable)?;
        let signing_key = key.signing_key()?;
        let signer = address_of(&signing_key);

        let (sig, recid) = signing_key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|_| PasskeyError::MalformedVaultedKey)?;
        let rs = sig.to_bytes();
        let signature = Signature::new(
            U256::from_be_slice(&rs[..32]),
            U256::from_be_slice(&rs[32..]),
            recid.is_y_odd(),
        );
        tracing::info!(chain_id = self.chain.chain_id, %signer, %hash, "Recovery hash authorized");

        Ok(RecoveryAuthorization {
            chain_id: self.chain.chain_id,
            signer,
            hash,
            signature,
        })
    }

    /// Sign `hash` with the passkey itself, using it as the challenge.
    pub async fn sign_with_passkey(
        &self,
        identity: &CredentialIdentity,
        hash: B256,
    ) -> Result<WebAuthnSignature, PasskeyError> {
        let options = RequestOptions::new(hash.to_vec(), vec![identity.raw_id.clone()]);
        let assertion = self
            .vault
            .assertion(options)
            .await?
            .ok_or(CeremonyError::NotAllowed)?;
        WebAuthnSignature::from_assertion(
            &assertion.authenticator_data,
            &assertion.client_data_json,
            &assertion.signature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer as _;

    fn der(sig: &p256::ecdsa::Signature) -> Vec<u8> {
        sig.to_der().as_bytes().to_vec()
    }

    #[test]
    fn test_webauthn_signature_verifies() {
        let key = p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
        let point = key.verifying_key().to_encoded_point(false);
        let coordinates = PubkeyCoordinates {
            x: U256::from_be_slice(point.x().unwrap()),
            y: U256::from_be_slice(point.y().unwrap()),
        };

        let hash = B256::repeat_byte(0x42);
        let client_data = format!(
            r#"{{"type":"webauthn.get","challenge":"{}","origin":"https://localhost","crossOrigin":false}}"#,
            URL_SAFE_NO_PAD.encode(hash)
        );
        let auth_data = [0x11u8; 37];
        let mut signed = auth_data.to_vec();
        signed.extend_from_slice(&Sha256::digest(client_data.as_bytes()));
        let sig: p256::ecdsa::Signature = key.sign(&signed);

        let webauthn =
            WebAuthnSignature::from_assertion(&auth_data, client_data.as_bytes(), &der(&sig)).unwrap();
        assert!(webauthn.verify(&coordinates, &hash));
        assert!(!webauthn.verify(&coordinates, &B256::repeat_byte(0x43)));
    }

    #[test]
    fn test_recover_signer_round_trip() {
        let key = k256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
        let hash = B256::repeat_byte(7);
        let (sig, recid) = key.sign_prehash_recoverable(hash.as_slice()).unwrap();
        let rs = sig.to_bytes();
        let auth = RecoveryAuthorization {
            chain_id: 1,
            signer: address_of(&key),
            hash,
            signature: Signature::new(
                U256::from_be_slice(&rs[..32]),
                U256::from_be_slice(&rs[32..]),
                recid.is_y_odd(),
            ),
        };
        assert_eq!(auth.recover_signer(), Some(auth.signer));
    }
}
