use crate::{ObjectError, ObjectKind};

/// Split `"<kind> <size>\0"` off the front of `data`.
///
/// Returns the kind, the declared payload size, and the header length
/// including the NUL.
pub fn parse_header(data: &[u8]) -> Result<(ObjectKind, usize, usize), ObjectError> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ObjectError::InvalidHeader("missing NUL terminator".into()))?;
    let header = &data[..nul];
    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ObjectError::InvalidHeader("missing space".into()))?;

    let kind = ObjectKind::from_bytes(&header[..space])?;
    let size = std::str::from_utf8(&header[space + 1..])
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| {
            ObjectError::InvalidHeader(format!(
                "invalid size: {}",
                String::from_utf8_lossy(&header[space + 1..])
            ))
        })?;
    Ok((kind, size, nul + 1))
}

/// Build `"<kind> <size>\0"`.
pub fn write_header(kind: ObjectKind, size: usize) -> Vec<u8> {
    format!("{} {}\0", kind, size).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let hdr = write_header(ObjectKind::Commit, 214);
        assert_eq!(hdr, b"commit 214\0");
        assert_eq!(parse_header(&hdr).unwrap(), (ObjectKind::Commit, 214, hdr.len()));
    }

    #[test]
    fn malformed() {
        assert!(parse_header(b"blob 12").is_err());
        assert!(parse_header(b"blob12\0").is_err());
        assert!(parse_header(b"blob -1\0").is_err());
        assert!(matches!(
            parse_header(b"tag 1\0x"),
            Err(ObjectError::InvalidKind(_))
        ));
    }
}
