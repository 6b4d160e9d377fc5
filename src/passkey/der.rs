//! ASN.1 DER ECDSA signature decoding.
//!
//! Only single-byte lengths are accepted: `30 L 02 Lr <r> 02 Ls <s>` with
//! `L`, `Lr` and `Ls` below 0x80. Anything else is rejected rather than
//! reinterpreted.

use alloy_primitives::U256;

use super::PasskeyError;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Decode a DER `SEQUENCE { INTEGER r, INTEGER s }` into `(r, s)`.
///
/// Both values must fit in 256 bits once leading zero bytes are stripped.
pub fn decode_signature(bytes: &[u8]) -> Result<(U256, U256), PasskeyError> {
    if bytes.len() < 2 || bytes[0] != TAG_SEQUENCE {
        return Err(PasskeyError::InvalidSignatureEncoding("expected SEQUENCE tag"));
    }
    let declared = bytes[1];
    if declared & 0x80 != 0 {
        return Err(PasskeyError::InvalidSignatureEncoding("multi-byte length"));
    }
    if declared as usize != bytes.len() - 2 {
        return Err(PasskeyError::InvalidSignatureEncoding("sequence length mismatch"));
    }

    let (r, rest) = read_integer(&bytes[2..])?;
    let (s, rest) = read_integer(rest)?;
    if !rest.is_empty() {
        return Err(PasskeyError::InvalidSignatureEncoding("trailing bytes"));
    }
    Ok((r, s))
}

fn read_integer(bytes: &[u8]) -> Result<(U256, &[u8]), PasskeyError> {
    let [tag, len, rest @ ..] = bytes else {
        return Err(PasskeyError::InvalidSignatureEncoding("truncated INTEGER header"));
    };
    if *tag != TAG_INTEGER {
        return Err(PasskeyError::InvalidSignatureEncoding("expected INTEGER tag"));
    }
    if len & 0x80 != 0 {
        return Err(PasskeyError::InvalidSignatureEncoding("multi-byte length"));
    }
    let len = *len as usize;
    if len == 0 {
        return Err(PasskeyError::InvalidSignatureEncoding("empty INTEGER"));
    }
    if len > rest.len() {
        return Err(PasskeyError::InvalidSignatureEncoding("INTEGER overruns buffer"));
    }
    let (value, rest) = rest.split_at(len);

    let first_nonzero = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let value = U256::try_from_be_slice(&value[first_nonzero..])
        .ok_or(PasskeyError::InvalidSignatureEncoding("INTEGER exceeds 256 bits"))?;
    Ok((value, rest))
}
