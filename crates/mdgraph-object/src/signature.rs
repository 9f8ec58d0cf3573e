use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::Local;

use crate::ObjectError;

/// Author or committer identity with a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    /// Seconds since the Unix epoch.
    pub time: i64,
    /// Offset from UTC in minutes.
    pub tz_offset: i32,
}

impl Signature {
    pub fn new(name: impl Into<BString>, email: impl Into<BString>, time: i64, tz_offset: i32) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            time,
            tz_offset,
        }
    }

    /// Signature stamped with the current local time.
    pub fn now(name: impl Into<BString>, email: impl Into<BString>) -> Self {
        let now = Local::now();
        Self::new(name, email, now.timestamp(), now.offset().local_minus_utc() / 60)
    }

    /// Parse `Name <email> 1700000000 +0100`.
    pub fn parse(input: &BStr) -> Result<Self, ObjectError> {
        let input = input.as_bytes();
        let gt = input
            .rfind_byte(b'>')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '>'".into()))?;
        let lt = input[..gt]
            .rfind_byte(b'<')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '<'".into()))?;

        let date = std::str::from_utf8(input[gt + 1..].trim())
            .map_err(|_| ObjectError::InvalidSignature("non-UTF-8 date".into()))?;
        let mut parts = date.split_whitespace();
        let time = parts
            .next()
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or_else(|| ObjectError::InvalidSignature(format!("invalid timestamp in '{date}'")))?;
        let tz_offset = match parts.next() {
            Some(tz) => parse_tz(tz)
                .ok_or_else(|| ObjectError::InvalidSignature(format!("invalid timezone '{tz}'")))?,
            None => 0,
        };

        Ok(Self {
            name: BString::from(input[..lt].trim()),
            email: BString::from(&input[lt + 1..gt]),
            time,
            tz_offset,
        })
    }

    /// Encode as `Name <email> time ±hhmm`.
    pub fn to_bytes(&self) -> BString {
        let sign = if self.tz_offset < 0 { '-' } else { '+' };
        let abs = self.tz_offset.unsigned_abs();
        let mut out = BString::from(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(format!("> {} {}{:02}{:02}", self.time, sign, abs / 60, abs % 60));
        out
    }
}

fn parse_tz(tz: &str) -> Option<i32> {
    let (sign, digits) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => (1, tz),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_negative_offset() {
        let raw = "Ada Lovelace <ada@example.org> 1700000000 -0530";
        let sig = Signature::parse(BStr::new(raw)).unwrap();
        assert_eq!(sig.name, "Ada Lovelace");
        assert_eq!(sig.email, "ada@example.org");
        assert_eq!(sig.tz_offset, -330);
        assert_eq!(sig.to_bytes(), raw);
    }

    #[test]
    fn missing_brackets() {
        assert!(Signature::parse(BStr::new("nobody 1 +0000")).is_err());
    }

    #[test]
    fn bad_timezone() {
        assert!(Signature::parse(BStr::new("a <b> 1 +5")).is_err());
    }
}
