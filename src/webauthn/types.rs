use std::time::Duration;

use crate::config::{ASSERTION_TIMEOUT, ENROLLMENT_TIMEOUT, ES256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LargeBlobSupport {
    Preferred,
    Required,
}

/// `largeBlob` client extension inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LargeBlobInputs {
    /// Only meaningful during registration.
    pub support: Option<LargeBlobSupport>,
    pub read: bool,
    pub write: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionInputs {
    pub large_blob: Option<LargeBlobInputs>,
}

/// `largeBlob` client extension outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LargeBlobOutputs {
    pub supported: Option<bool>,
    pub blob: Option<Vec<u8>>,
    pub written: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionResults {
    pub large_blob: Option<LargeBlobOutputs>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttestationConveyance {
    #[default]
    None,
    Direct,
}

/// Options for a credential creation ceremony.
#[derive(Debug, Clone)]
pub struct CreationOptions {
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user: UserEntity,
    /// COSE algorithm identifiers in order of preference.
    pub pub_key_cred_params: Vec<i64>,
    pub timeout: Duration,
    pub attestation: AttestationConveyance,
    pub exclude_credentials: Vec<Vec<u8>>,
    pub extensions: ExtensionInputs,
}

impl CreationOptions {
    pub fn new(challenge: Vec<u8>, rp: RelyingParty, user: UserEntity) -> Self {
        Self {
            challenge,
            rp,
            user,
            pub_key_cred_params: vec![ES256],
            timeout: ENROLLMENT_TIMEOUT,
            attestation: AttestationConveyance::None,
            exclude_credentials: Vec::new(),
            extensions: ExtensionInputs::default(),
        }
    }
}

/// Options for an assertion ceremony.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub challenge: Vec<u8>,
    pub rp_id: Option<String>,
    pub allow_credentials: Vec<Vec<u8>>,
    pub timeout: Duration,
    pub extensions: ExtensionInputs,
}

impl RequestOptions {
    pub fn new(challenge: Vec<u8>, allow_credentials: Vec<Vec<u8>>) -> Self {
        Self {
            challenge,
            rp_id: None,
            allow_credentials,
            timeout: ASSERTION_TIMEOUT,
            extensions: ExtensionInputs::default(),
        }
    }

    pub fn with_large_blob(mut self, inputs: LargeBlobInputs) -> Self {
        self.extensions.large_blob = Some(inputs);
        self
    }
}

/// Result of a successful creation ceremony.
#[derive(Debug, Clone)]
pub struct AttestationResponse {
    pub raw_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
    /// SubjectPublicKeyInfo DER of the credential public key.
    pub public_key: Option<Vec<u8>>,
    pub public_key_algorithm: i64,
    pub extension_results: ExtensionResults,
}

impl AttestationResponse {
    pub fn get_public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }
}

/// Result of a successful assertion ceremony.
#[derive(Debug, Clone)]
pub struct AssertionResponse {
    pub raw_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    /// ASN.1 DER encoded ECDSA signature.
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
    pub extension_results: ExtensionResults,
}
