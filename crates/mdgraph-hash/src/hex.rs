use crate::HashError;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

fn nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Lowercase hex encoding of `bytes`.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decode `hex` into `buf`; `hex` must be exactly twice as long as `buf`.
pub fn decode_into(hex: &str, buf: &mut [u8]) -> Result<(), HashError> {
    let hex = hex.as_bytes();
    if hex.len() != buf.len() * 2 {
        return Err(HashError::InvalidHexLength {
            expected: buf.len() * 2,
            actual: hex.len(),
        });
    }
    for (i, out) in buf.iter_mut().enumerate() {
        let mut byte = 0u8;
        for pos in [i * 2, i * 2 + 1] {
            let n = nibble(hex[pos]).ok_or(HashError::InvalidHex {
                position: pos,
                character: hex[pos] as char,
            })?;
            byte = (byte << 4) | n;
        }
        *out = byte;
    }
    Ok(())
}

/// True if `s` is a non-empty, even-length string of hex digits.
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|b| nibble(b).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known() {
        assert_eq!(encode(&[0xde, 0xad, 0x00, 0xff]), "dead00ff");
    }

    #[test]
    fn decode_mixed_case() {
        let mut buf = [0u8; 4];
        decode_into("DeAdBeEf", &mut buf).unwrap();
        assert_eq!(buf, [0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn decode_reports_position() {
        let mut buf = [0u8; 2];
        let err = decode_into("a-bc", &mut buf).unwrap_err();
        assert!(matches!(err, HashError::InvalidHex { position: 1, character: '-' }));
    }

    #[test]
    fn is_hex_checks() {
        assert!(is_hex("00ff"));
        assert!(!is_hex("0"));
        assert!(!is_hex(""));
        assert!(!is_hex("zz"));
    }
}
