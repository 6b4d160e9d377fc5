use ciborium::value::Value;

use crate::config::ES256;
use crate::webauthn::{AttestationConveyance, CeremonyError};

/// Build the CBOR attestation object.
///
/// `None` conveyance yields the "none" format with an empty statement;
/// anything else yields "packed" self attestation over `der_sig`.
pub(crate) fn build_attestation_object(
    conveyance: AttestationConveyance,
    auth_data: &[u8],
    der_sig: &[u8],
) -> Result<Vec<u8>, CeremonyError> {
    let (fmt, att_stmt) = match conveyance {
        AttestationConveyance::None => ("none", Value::Map(vec![])),
        AttestationConveyance::Direct => (
            "packed",
            Value::Map(vec![
                (Value::Text("alg".to_string()), Value::Integer(ES256.into())),
                (Value::Text("sig".to_string()), Value::Bytes(der_sig.to_vec())),
            ]),
        ),
    };
    let map = Value::Map(vec![
        (Value::Text("fmt".to_string()), Value::Text(fmt.to_string())),
        (Value::Text("attStmt".to_string()), att_stmt),
        (Value::Text("authData".to_string()), Value::Bytes(auth_data.to_vec())),
    ]);
    let mut buf = Vec::new();
    ciborium::into_writer(&map, &mut buf).map_err(|e| CeremonyError::Encoding(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<(Value, Value)> {
        match ciborium::from_reader(bytes).unwrap() {
            Value::Map(m) => m,
            other => panic!("expected map, got {other:?}"),
        }
    }

    fn field<'a>(map: &'a [(Value, Value)], key: &str) -> &'a Value {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
            .map(|(_, v)| v)
            .unwrap()
    }

    #[test]
    fn test_none_format_has_empty_statement() {
        let obj = build_attestation_object(AttestationConveyance::None, b"auth", b"sig").unwrap();
        let map = decode(&obj);
        assert_eq!(field(&map, "fmt"), &Value::Text("none".into()));
        assert_eq!(field(&map, "attStmt"), &Value::Map(vec![]));
        assert_eq!(field(&map, "authData"), &Value::Bytes(b"auth".to_vec()));
    }

    #[test]
    fn test_packed_format_carries_signature() {
        let obj = build_attestation_object(AttestationConveyance::Direct, b"auth", b"sig").unwrap();
        let map = decode(&obj);
        assert_eq!(field(&map, "fmt"), &Value::Text("packed".into()));
        let Value::Map(stmt) = field(&map, "attStmt") else {
            panic!("attStmt not a map")
        };
        assert_eq!(field(stmt, "sig"), &Value::Bytes(b"sig".to_vec()));
    }
}
