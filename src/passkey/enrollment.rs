use alloy_primitives::U256;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::pkcs8::DecodePublicKey;
use rand::RngCore;

use super::{Challenge, CredentialIdentity, PasskeyError, PubkeyCoordinates};
use crate::config::{ES256, EnrollmentConfig};
use crate::webauthn::{
    Authenticator, CreationOptions, LargeBlobInputs, LargeBlobSupport, RelyingParty, UserEntity,
};

/// Create a passkey and derive its public key coordinates.
///
/// The passkey is asked for `largeBlob` support as preferred, so enrollment
/// still succeeds on authenticators without it.
pub async fn enroll<A: Authenticator>(
    authenticator: &A,
    config: &EnrollmentConfig,
    challenge: &Challenge,
) -> Result<CredentialIdentity, PasskeyError> {
    let mut user_id = vec![0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut user_id);

    let mut options = CreationOptions::new(
        challenge.as_bytes().to_vec(),
        RelyingParty {
            id: config.rp_id.clone(),
            name: config.rp_name.clone(),
        },
        UserEntity {
            id: user_id,
            name: config.user_name.clone(),
            display_name: config.user_display_name.clone(),
        },
    );
    options.pub_key_cred_params = vec![ES256];
    options.timeout = config.timeout;
    options.extensions.large_blob = Some(LargeBlobInputs {
        support: Some(LargeBlobSupport::Preferred),
        ..LargeBlobInputs::default()
    });
    tracing::debug!(rp_name = %config.rp_name, "Starting enrollment ceremony");

    let response = match tokio::time::timeout(config.timeout, authenticator.create(options)).await {
        Ok(Ok(Some(response))) => response,
        Ok(Ok(None)) => {
            return Err(PasskeyError::EnrollmentFailed(
                "received null as a credential".into(),
            ));
        }
        Ok(Err(e)) => return Err(PasskeyError::EnrollmentFailed(e.to_string())),
        Err(_) => return Err(PasskeyError::EnrollmentFailed("ceremony timed out".into())),
    };

    let spki = response
        .get_public_key()
        .ok_or_else(|| PasskeyError::KeyExportFailed("no public key in attestation".into()))?;
    let pubkey_coordinates = coordinates_from_spki(spki)?;

    let supported = response
        .extension_results
        .large_blob
        .as_ref()
        .and_then(|lb| lb.supported);
    tracing::info!(
        raw_id = %alloy_primitives::hex::encode(&response.raw_id),
        large_blob = ?supported,
        "Passkey enrolled"
    );

    Ok(CredentialIdentity {
        raw_id: response.raw_id,
        pubkey_coordinates,
    })
}

/// Import an SPKI P-256 key and read `x`/`y` from its JWK export.
pub(crate) fn coordinates_from_spki(spki: &[u8]) -> Result<PubkeyCoordinates, PasskeyError> {
    let key = p256::PublicKey::from_public_key_der(spki)
        .map_err(|e| PasskeyError::KeyExportFailed(format!("SPKI import: {e}")))?;
    let jwk: serde_json::Value = serde_json::from_str(&key.to_jwk_string())
        .map_err(|e| PasskeyError::KeyExportFailed(format!("JWK export: {e}")))?;
    Ok(PubkeyCoordinates {
        x: jwk_coordinate(&jwk, "x")?,
        y: jwk_coordinate(&jwk, "y")?,
    })
}

fn jwk_coordinate(jwk: &serde_json::Value, name: &str) -> Result<U256, PasskeyError> {
    let encoded = jwk
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PasskeyError::KeyExportFailed(format!("missing {name} coordinate")))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| PasskeyError::KeyExportFailed(format!("{name}: {e}")))?;
    U256::try_from_be_slice(&bytes)
        .ok_or_else(|| PasskeyError::KeyExportFailed(format!("{name} wider than 256 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::pkcs8::EncodePublicKey;
    use serde_json::json;

    #[test]
    fn test_coordinates_match_sec1_point() {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let public = secret.public_key();
        let spki = public.to_public_key_der().unwrap();
        let coords = coordinates_from_spki(spki.as_bytes()).unwrap();

        let point = p256::elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(&public, false);
        assert_eq!(coords.to_sec1_uncompressed().as_slice(), point.as_bytes());
    }

    #[test]
    fn test_garbage_spki_is_export_failure() {
        assert!(matches!(
            coordinates_from_spki(&[0x30, 0x00]),
            Err(PasskeyError::KeyExportFailed(_))
        ));
    }

    #[test]
    fn test_missing_coordinate_is_export_failure() {
        let jwk = json!({ "kty": "EC", "crv": "P-256", "x": "AQ" });
        assert_eq!(jwk_coordinate(&jwk, "x").unwrap(), U256::from(1));
        assert!(matches!(
            jwk_coordinate(&jwk, "y"),
            Err(PasskeyError::KeyExportFailed(_))
        ));
    }
}
