use alloy_primitives::hex;
use sha2::{Digest, Sha256};

use super::Inner;
use super::authenticator_data::{authenticator_data, encode_der_ecdsa};
use super::client_data::{TYPE_GET, collect_client_data, origin_host};
use super::keys;
use crate::webauthn::{
    AssertionResponse, CeremonyError, ExtensionResults, LargeBlobInputs, LargeBlobOutputs,
    RequestOptions,
};

fn check_large_blob_inputs(
    inputs: Option<&LargeBlobInputs>,
    allow_count: usize,
) -> Result<(), CeremonyError> {
    let Some(lb) = inputs else { return Ok(()) };
    if lb.read && lb.write.is_some() {
        return Err(CeremonyError::NotSupported("largeBlob read and write in one ceremony"));
    }
    if lb.write.is_some() && allow_count != 1 {
        return Err(CeremonyError::NotSupported(
            "largeBlob write requires exactly one allowed credential",
        ));
    }
    Ok(())
}

pub(crate) async fn handle_get_assertion(
    inner: &Inner,
    options: RequestOptions,
) -> Result<AssertionResponse, CeremonyError> {
    check_large_blob_inputs(
        options.extensions.large_blob.as_ref(),
        options.allow_credentials.len(),
    )?;

    let rp_id = options
        .rp_id
        .clone()
        .unwrap_or_else(|| origin_host(&inner.config.origin).to_string());
    let rp_id_hash: [u8; 32] = Sha256::digest(rp_id.as_bytes()).into();

    // Find credential
    let mut cred = {
        let guard = inner.lock_store()?;
        let found = if !options.allow_credentials.is_empty() {
            options.allow_credentials.iter().find_map(|id| {
                guard
                    .get_by_id(id)
                    .filter(|c| c.rp_id_hash.as_slice() == rp_id_hash.as_slice())
            })
        } else {
            guard.get_by_rp_hash(&rp_id_hash).into_iter().next()
        };
        match found {
            Some(c) => c.clone(),
            None => {
                tracing::debug!(rp_id = %rp_id, "No matching credential");
                return Err(CeremonyError::NotAllowed);
            }
        }
    };

    // User presence
    let blob_write = options
        .extensions
        .large_blob
        .as_ref()
        .is_some_and(|lb| lb.write.is_some());
    let prompt = crate::up::get_assertion_prompt(&rp_id, cred.user_display.as_deref(), blob_write);
    let proof =
        crate::up::require_user_presence(&prompt, &inner.config.presence, options.timeout).await?;
    tracing::info!(rp_id = %rp_id, "User presence confirmed");

    // Sign
    cred.sign_count = cred.sign_count.wrapping_add(1);
    let auth_data = authenticator_data(&rp_id_hash, cred.sign_count, None);
    let client_data_json = collect_client_data(TYPE_GET, &options.challenge, &inner.config.origin);
    let mut to_sign = auth_data.clone();
    to_sign.extend_from_slice(&Sha256::digest(&client_data_json));
    let signature = encode_der_ecdsa(&keys::sign(&cred.key_private, &to_sign, &proof)?);

    // Large blob
    let large_blob = match options.extensions.large_blob {
        Some(_) if !inner.config.large_blob_support => None,
        None => None,
        Some(LargeBlobInputs { write: Some(data), .. }) => {
            let written = data.len() <= inner.config.large_blob_capacity;
            if written {
                cred.large_blob = Some(data);
            } else {
                tracing::warn!(
                    len = data.len(),
                    capacity = inner.config.large_blob_capacity,
                    "Large blob exceeds capacity"
                );
            }
            Some(LargeBlobOutputs { written: Some(written), ..LargeBlobOutputs::default() })
        }
        Some(LargeBlobInputs { read: true, .. }) => Some(LargeBlobOutputs {
            blob: cred.large_blob.clone(),
            ..LargeBlobOutputs::default()
        }),
        Some(_) => Some(LargeBlobOutputs::default()),
    };

    let raw_id = cred.credential_id.clone();
    let user_handle = Some(cred.user_id.clone());
    inner.lock_store()?.update(cred)?;
    tracing::debug!(cred_id = hex::encode(&raw_id), "Assertion produced");

    Ok(AssertionResponse {
        raw_id,
        client_data_json,
        authenticator_data: auth_data,
        signature,
        user_handle,
        extension_results: ExtensionResults { large_blob },
    })
}
