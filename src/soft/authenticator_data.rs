use ciborium::value::Value;

use crate::config::{AAGUID, ES256};

pub(crate) const FLAG_UP: u8 = 0x01;
pub(crate) const FLAG_AT: u8 = 0x40;

/// Credential data attached to authenticatorData on creation.
pub(crate) struct AttestedCredential<'a> {
    pub credential_id: &'a [u8],
    pub x: &'a [u8; 32],
    pub y: &'a [u8; 32],
}

/// `rpIdHash || flags || signCount [|| aaguid || idLen || id || COSE key]`.
///
/// The AT flag is set exactly when `attested` is present.
pub(crate) fn authenticator_data(
    rp_id_hash: &[u8; 32],
    sign_count: u32,
    attested: Option<AttestedCredential<'_>>,
) -> Vec<u8> {
    let flags = if attested.is_some() { FLAG_UP | FLAG_AT } else { FLAG_UP };
    let mut data = Vec::with_capacity(37);
    data.extend_from_slice(rp_id_hash);
    data.push(flags);
    data.extend_from_slice(&sign_count.to_be_bytes());

    if let Some(cred) = attested {
        data.extend_from_slice(&AAGUID);
        data.extend_from_slice(&(cred.credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(cred.credential_id);
        data.extend_from_slice(&encode_cose_key(cred.x, cred.y));
    }
    data
}

fn int(i: i64) -> Value {
    Value::Integer(i.into())
}

/// EC2 COSE_Key for a P-256 public key.
pub(crate) fn encode_cose_key(x: &[u8; 32], y: &[u8; 32]) -> Vec<u8> {
    let key = Value::Map(vec![
        (int(1), int(2)), // kty: EC2
        (int(3), int(ES256)), // alg
        (int(-1), int(1)), // crv: P-256
        (int(-2), Value::Bytes(x.to_vec())),
        (int(-3), Value::Bytes(y.to_vec())),
    ]);
    let mut out = Vec::new();
    ciborium::into_writer(&key, &mut out).expect("COSE key encoding is infallible");
    out
}

/// DER `SEQUENCE { INTEGER r, INTEGER s }` for a raw `r || s` signature,
/// with minimal integers.
pub fn encode_der_ecdsa(raw: &[u8; 64]) -> Vec<u8> {
    let mut body = Vec::with_capacity(70);
    push_der_integer(&mut body, &raw[..32]);
    push_der_integer(&mut body, &raw[32..]);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(0x30);
    out.push(body.len() as u8);
    out.extend_from_slice(&body);
    out
}

fn push_der_integer(out: &mut Vec<u8>, be: &[u8]) {
    // Zero still needs one content byte.
    let start = be.iter().position(|b| *b != 0).unwrap_or(be.len() - 1);
    let value = &be[start..];
    let pad = value[0] & 0x80 != 0;
    out.push(0x02);
    out.push((value.len() + usize::from(pad)) as u8);
    if pad {
        out.push(0x00);
    }
    out.extend_from_slice(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_high_bit_gets_zero_pad() {
        let der = encode_der_ecdsa(&[0xffu8; 64]);
        assert_eq!(der.len(), 72);
        assert_eq!(der[1], 0x46);
        assert_eq!(&der[2..5], &[0x02, 0x21, 0x00]);
        assert_eq!(&der[37..40], &[0x02, 0x21, 0x00]);
    }

    #[test]
    fn test_der_minimal_integers() {
        let mut raw = [0u8; 64];
        raw[31] = 0x05;
        let der = encode_der_ecdsa(&raw);
        assert_eq!(der, [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_der_agrees_with_p256() {
        let raw = [0x3cu8; 64];
        let sig = p256::ecdsa::Signature::from_slice(&raw).unwrap();
        assert_eq!(encode_der_ecdsa(&raw), sig.to_der().as_bytes());
    }

    #[test]
    fn test_cose_key_is_ec2_p256() {
        let encoded = encode_cose_key(&[0x0a; 32], &[0x0b; 32]);
        let Value::Map(entries) = ciborium::from_reader::<Value, _>(encoded.as_slice()).unwrap()
        else {
            panic!("COSE key is not a map");
        };
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0], (int(1), int(2)));
        assert_eq!(entries[1], (int(3), int(-7)));
        assert_eq!(entries[2], (int(-1), int(1)));
        assert_eq!(entries[3].1, Value::Bytes(vec![0x0a; 32]));
    }

    #[test]
    fn test_assertion_data_has_no_attested_credential() {
        let data = authenticator_data(&[0x01; 32], 7, None);
        assert_eq!(data.len(), 37);
        assert_eq!(data[32], FLAG_UP);
        assert_eq!(&data[33..], &7u32.to_be_bytes());
    }

    #[test]
    fn test_creation_data_layout() {
        let cred = AttestedCredential {
            credential_id: &[0x77; 32],
            x: &[0x11; 32],
            y: &[0x22; 32],
        };
        let data = authenticator_data(&[0x02; 32], 0, Some(cred));
        assert_eq!(data[32], FLAG_UP | FLAG_AT);
        assert_eq!(&data[33..37], &[0; 4]);
        assert_eq!(&data[37..53], &AAGUID);
        assert_eq!(&data[53..55], &[0x00, 0x20]);
        assert_eq!(&data[55..87], &[0x77; 32]);
        assert_eq!(&data[87..], encode_cose_key(&[0x11; 32], &[0x22; 32]).as_slice());
    }
}
