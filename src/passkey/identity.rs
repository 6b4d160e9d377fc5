use alloy_primitives::{U256, hex};
use serde::{Deserialize, Serialize};

use super::PasskeyError;

/// Affine coordinates of a P-256 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubkeyCoordinates {
    pub x: U256,
    pub y: U256,
}

impl PubkeyCoordinates {
    /// Uncompressed SEC1 encoding, `04 || x || y`.
    pub fn to_sec1_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&self.x.to_be_bytes::<32>());
        out[33..].copy_from_slice(&self.y.to_be_bytes::<32>());
        out
    }
}

/// An enrolled passkey: the handle used to address it in later ceremonies
/// and the public key derived once at enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialIdentity {
    pub raw_id: Vec<u8>,
    pub pubkey_coordinates: PubkeyCoordinates,
}

impl CredentialIdentity {
    /// Lowercase hex of the raw id, without prefix.
    pub fn raw_id_hex(&self) -> String {
        hex::encode(&self.raw_id)
    }
}

/// Durable, secret-free form of a [`CredentialIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStorageRecord {
    pub raw_id: String,
    pub pubkey_coordinates: PubkeyCoordinates,
}

impl LocalStorageRecord {
    pub fn to_identity(&self) -> Result<CredentialIdentity, PasskeyError> {
        let raw_id = hex::decode(&self.raw_id)
            .map_err(|e| PasskeyError::MalformedRecord(format!("rawId: {e}")))?;
        if raw_id.is_empty() {
            return Err(PasskeyError::MalformedRecord("rawId is empty".into()));
        }
        Ok(CredentialIdentity {
            raw_id,
            pubkey_coordinates: self.pubkey_coordinates,
        })
    }

    /// Validate an arbitrary JSON value and convert it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PasskeyError> {
        if !is_local_storage_passkey(&value) {
            return Err(PasskeyError::MalformedRecord(
                "expected {rawId, pubkeyCoordinates: {x, y}}".into(),
            ));
        }
        serde_json::from_value(value).map_err(|e| PasskeyError::MalformedRecord(e.to_string()))
    }
}

pub fn to_local_storage_format(identity: &CredentialIdentity) -> LocalStorageRecord {
    LocalStorageRecord {
        raw_id: identity.raw_id_hex(),
        pubkey_coordinates: identity.pubkey_coordinates,
    }
}

/// Whether `value` has the shape of a [`LocalStorageRecord`]: a non-empty hex
/// `rawId` and a `pubkeyCoordinates` object whose `x` and `y` are 256-bit
/// integers.
pub fn is_local_storage_passkey(value: &serde_json::Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let raw_id_ok = obj
        .get("rawId")
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.is_empty() && hex::decode(s).is_ok());
    let Some(coords) = obj.get("pubkeyCoordinates").and_then(|v| v.as_object()) else {
        return false;
    };
    let coord_ok = |key: &str| {
        coords
            .get(key)
            .is_some_and(|v| serde_json::from_value::<U256>(v.clone()).is_ok())
    };
    raw_id_ok && coord_ok("x") && coord_ok("y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> CredentialIdentity {
        CredentialIdentity {
            raw_id: vec![0xde, 0xad, 0xbe, 0xef],
            pubkey_coordinates: PubkeyCoordinates {
                x: U256::from(7),
                y: U256::MAX,
            },
        }
    }

    #[test]
    fn test_local_storage_format_uses_plain_hex() {
        let record = to_local_storage_format(&identity());
        assert_eq!(record.raw_id, "deadbeef");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("rawId").is_some());
        assert!(value["pubkeyCoordinates"].get("x").is_some());
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = to_local_storage_format(&identity());
        let text = serde_json::to_string(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(is_local_storage_passkey(&value));
        let back = LocalStorageRecord::from_value(value).unwrap();
        assert_eq!(back.to_identity().unwrap(), identity());
    }

    #[test]
    fn test_predicate_rejects_wrong_shapes() {
        assert!(!is_local_storage_passkey(&json!(null)));
        assert!(!is_local_storage_passkey(&json!("deadbeef")));
        assert!(!is_local_storage_passkey(&json!({ "rawId": "deadbeef" })));
        assert!(!is_local_storage_passkey(&json!({
            "rawId": "not hex",
            "pubkeyCoordinates": { "x": "0x1", "y": "0x2" }
        })));
        assert!(!is_local_storage_passkey(&json!({
            "rawId": "deadbeef",
            "pubkeyCoordinates": { "x": "0x1" }
        })));
        assert!(!is_local_storage_passkey(&json!({
            "rawId": "deadbeef",
            "pubkeyCoordinates": { "x": "0x1", "y": true }
        })));
    }

    #[test]
    fn test_predicate_accepts_hex_coordinates() {
        assert!(is_local_storage_passkey(&json!({
            "rawId": "deadbeef",
            "pubkeyCoordinates": { "x": "0x1", "y": "0x2" }
        })));
    }

    #[test]
    fn test_from_value_reports_malformed() {
        let err = LocalStorageRecord::from_value(json!({})).unwrap_err();
        assert!(matches!(err, PasskeyError::MalformedRecord(_)));
    }

    #[test]
    fn test_sec1_encoding() {
        let sec1 = identity().pubkey_coordinates.to_sec1_uncompressed();
        assert_eq!(sec1[0], 0x04);
        assert_eq!(sec1[32], 7);
        assert!(sec1[33..].iter().all(|b| *b == 0xff));
    }
}
