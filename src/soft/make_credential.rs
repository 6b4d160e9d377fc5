use alloy_primitives::hex;
use rand::Rng;
use sha2::{Digest, Sha256};

use super::Inner;
use super::attestation::build_attestation_object;
use super::authenticator_data::{AttestedCredential, authenticator_data, encode_der_ecdsa};
use super::client_data::{TYPE_CREATE, collect_client_data, origin_host};
use super::keys;
use crate::config::ES256;
use crate::store::CredentialRecord;
use crate::webauthn::{
    AttestationResponse, CeremonyError, CreationOptions, ExtensionResults, LargeBlobOutputs,
    LargeBlobSupport,
};

pub(crate) async fn handle_make_credential(
    inner: &Inner,
    options: CreationOptions,
) -> Result<AttestationResponse, CeremonyError> {
    // 1. Validate algorithm
    if !options.pub_key_cred_params.contains(&ES256) {
        return Err(CeremonyError::NotSupported("no supported public key algorithm"));
    }

    // 2. Compute rp_id_hash and check excludeCredentials
    let rp_id = options
        .rp
        .id
        .clone()
        .unwrap_or_else(|| origin_host(&inner.config.origin).to_string());
    let rp_id_hash: [u8; 32] = Sha256::digest(rp_id.as_bytes()).into();
    {
        let guard = inner.lock_store()?;
        for exc_id in &options.exclude_credentials {
            if let Some(cred) = guard.get_by_id(exc_id) {
                if cred.rp_id_hash == rp_id_hash.as_slice() {
                    return Err(CeremonyError::CredentialExcluded);
                }
            }
        }
    }

    let blob_support = options
        .extensions
        .large_blob
        .as_ref()
        .and_then(|lb| lb.support);
    if blob_support == Some(LargeBlobSupport::Required) && !inner.config.large_blob_support {
        return Err(CeremonyError::NotSupported("largeBlob"));
    }

    // 3. User presence
    let prompt = crate::up::make_credential_prompt(
        &rp_id,
        Some(options.rp.name.as_str()),
        Some(options.user.display_name.as_str()),
    );
    let proof =
        crate::up::require_user_presence(&prompt, &inner.config.presence, options.timeout).await?;
    tracing::info!(rp_id = %rp_id, "User presence confirmed");

    // 4. Credential id and key pair
    let cred_id: [u8; 32] = rand::thread_rng().r#gen();
    let key = keys::create_credential_key()?;

    // 5. Authenticator data, client data and self signature
    let auth_data = authenticator_data(
        &rp_id_hash,
        0,
        Some(AttestedCredential {
            credential_id: &cred_id,
            x: &key.x,
            y: &key.y,
        }),
    );
    let client_data_json =
        collect_client_data(TYPE_CREATE, &options.challenge, &inner.config.origin);
    let mut to_sign = auth_data.clone();
    to_sign.extend_from_slice(&Sha256::digest(&client_data_json));
    let der_sig = encode_der_ecdsa(&keys::sign(&key.secret, &to_sign, &proof)?);

    // 6. Store credential
    let created_at = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let record = CredentialRecord {
        version: 1,
        credential_id: cred_id.to_vec(),
        rp_id,
        rp_id_hash: rp_id_hash.to_vec(),
        rp_name: Some(options.rp.name),
        user_id: options.user.id,
        user_name: Some(options.user.name),
        user_display: Some(options.user.display_name),
        public_key_x: key.x.to_vec(),
        public_key_y: key.y.to_vec(),
        key_private: key.secret.to_vec(),
        sign_count: 0,
        large_blob: None,
        created_at,
        discoverable: true,
    };

    inner.lock_store()?.add(record)?;
    tracing::info!(cred_id = hex::encode(cred_id), "Credential stored");

    // 7. Attestation object and extension outputs
    let attestation_object = build_attestation_object(options.attestation, &auth_data, &der_sig)?;
    let large_blob = blob_support.map(|_| LargeBlobOutputs {
        supported: Some(inner.config.large_blob_support),
        ..LargeBlobOutputs::default()
    });

    Ok(AttestationResponse {
        raw_id: cred_id.to_vec(),
        client_data_json,
        attestation_object,
        public_key: Some(key.spki),
        public_key_algorithm: ES256,
        extension_results: ExtensionResults { large_blob },
    })
}
