use bstr::{BStr, BString, ByteSlice};
use mdgraph_hash::ObjectId;

use crate::{ObjectError, Signature};

/// Header naming the commit in an external version-control history that a
/// metadata snapshot describes.
const SOURCE_COMMIT: &[u8] = b"source-commit";

/// A snapshot record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    /// Optional link to an external commit (hex id or any opaque token).
    pub source_commit: Option<BString>,
    /// Unrecognised headers, kept for byte-identical re-encoding.
    pub extra_headers: Vec<(BString, BString)>,
    pub message: BString,
}

impl Commit {
    pub fn new(tree: ObjectId, author: Signature, message: impl Into<BString>) -> Self {
        Self {
            tree,
            parents: Vec::new(),
            committer: author.clone(),
            author,
            source_commit: None,
            extra_headers: Vec::new(),
            message: message.into(),
        }
    }

    pub fn parse(payload: &[u8]) -> Result<Self, ObjectError> {
        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut source_commit = None;
        let mut extra_headers = Vec::new();

        let mut pos = 0;
        while pos < payload.len() {
            if payload[pos] == b'\n' {
                pos += 1;
                break;
            }
            let line_end = payload[pos..]
                .find_byte(b'\n')
                .map_or(payload.len(), |p| p + pos);
            let line = &payload[pos..line_end];
            let (key, value) = match line.find_byte(b' ') {
                Some(sp) => (&line[..sp], &line[sp + 1..]),
                None => (line, &b""[..]),
            };

            match key {
                b"tree" => tree = Some(parse_oid(value, "tree")?),
                b"parent" => parents.push(parse_oid(value, "parent")?),
                b"author" => author = Some(Signature::parse(value.as_bstr())?),
                b"committer" => committer = Some(Signature::parse(value.as_bstr())?),
                SOURCE_COMMIT => {
                    let (val, next) = header_value(payload, value, line_end);
                    source_commit = Some(BString::from(val));
                    pos = next;
                    continue;
                }
                _ => {
                    let (val, next) = header_value(payload, value, line_end);
                    extra_headers.push((BString::from(key), BString::from(val)));
                    pos = next;
                    continue;
                }
            }
            pos = line_end + 1;
        }

        Ok(Self {
            tree: tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?,
            parents,
            author: author.ok_or(ObjectError::MissingCommitField { field: "author" })?,
            committer: committer.ok_or(ObjectError::MissingCommitField { field: "committer" })?,
            source_commit,
            extra_headers,
            message: BString::from(payload.get(pos..).unwrap_or_default()),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_header(&mut out, b"tree", self.tree.to_hex().as_bytes());
        for parent in &self.parents {
            push_header(&mut out, b"parent", parent.to_hex().as_bytes());
        }
        push_header(&mut out, b"author", &self.author.to_bytes());
        push_header(&mut out, b"committer", &self.committer.to_bytes());
        if let Some(link) = &self.source_commit {
            push_header(&mut out, SOURCE_COMMIT, link);
        }
        for (key, val) in &self.extra_headers {
            push_header(&mut out, key, val);
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// First line of the message.
    pub fn summary(&self) -> &BStr {
        let msg: &[u8] = self.message.as_ref();
        msg.lines().next().unwrap_or_default().as_bstr()
    }
}

fn parse_oid(value: &[u8], field: &str) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF-8 {field} id")))?;
    Ok(ObjectId::from_hex(hex)?)
}

/// A header value with its continuation lines joined, and the offset just
/// past it. Continuation lines start with a single space.
fn header_value(payload: &[u8], first: &[u8], line_end: usize) -> (Vec<u8>, usize) {
    let mut val = first.to_vec();
    let mut next = line_end + 1;
    while next < payload.len() && payload[next] == b' ' {
        let cont_end = payload[next..]
            .find_byte(b'\n')
            .map_or(payload.len(), |p| p + next);
        val.push(b'\n');
        val.extend_from_slice(&payload[next + 1..cont_end]);
        next = cont_end + 1;
    }
    (val, next)
}

fn push_header(out: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    out.extend_from_slice(key);
    out.push(b' ');
    for (i, line) in value.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\n ");
        }
        out.extend_from_slice(line);
    }
    out.push(b'\n');
}
