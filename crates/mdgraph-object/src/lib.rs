//! Content-addressable object encoding: blobs, trees and commits.
//!
//! Encodings are pure functions of the logical content, so two objects hash
//! to the same [`ObjectId`] exactly when they are structurally equal. The
//! tree merger depends on that to tell a real change from a rewrite of
//! identical content.

mod blob;
mod commit;
pub mod header;
mod signature;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use signature::Signature;
pub use tree::{EntryKind, FileMode, Tree, TreeEntry};

use bstr::BString;
use mdgraph_hash::hasher::Hasher;
use mdgraph_hash::{HashAlgorithm, HashError, ObjectId};

/// Errors produced while decoding objects.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object kind: {0}")]
    InvalidKind(BString),

    #[error("invalid object header: {0}")]
    InvalidHeader(String),

    #[error("truncated object: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid tree entry at offset {offset}: {reason}")]
    InvalidTreeEntry { offset: usize, reason: String },

    #[error("invalid file mode: {0}")]
    InvalidFileMode(String),

    #[error("invalid commit: missing '{field}' header")]
    MissingCommitField { field: &'static str },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// The object kinds a realm stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        match s {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            _ => Err(ObjectError::InvalidKind(BString::from(s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// A decoded object of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    /// Decode a framed object (`"<kind> <len>\0"` followed by the payload).
    pub fn parse(data: &[u8], algo: HashAlgorithm) -> Result<Self, ObjectError> {
        let (kind, size, header_len) = header::parse_header(data)?;
        let payload = &data[header_len..];
        if payload.len() != size {
            return Err(ObjectError::Truncated {
                expected: size,
                actual: payload.len(),
            });
        }
        Self::parse_payload(kind, payload, algo)
    }

    /// Decode a payload whose kind is already known.
    pub fn parse_payload(
        kind: ObjectKind,
        payload: &[u8],
        algo: HashAlgorithm,
    ) -> Result<Self, ObjectError> {
        Ok(match kind {
            ObjectKind::Blob => Self::Blob(Blob::parse(payload)),
            ObjectKind::Tree => Self::Tree(Tree::parse(payload, algo)?),
            ObjectKind::Commit => Self::Commit(Commit::parse(payload)?),
        })
    }

    /// Encode the payload only.
    pub fn encode_payload(&self) -> Vec<u8> {
        match self {
            Self::Blob(b) => b.data.clone(),
            Self::Tree(t) => t.encode(),
            Self::Commit(c) => c.encode(),
        }
    }

    /// Encode header and payload.
    pub fn encode(&self) -> Vec<u8> {
        let payload = self.encode_payload();
        let mut out = header::write_header(self.kind(), payload.len());
        out.extend_from_slice(&payload);
        out
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Content address of this object.
    pub fn compute_oid(&self, algo: HashAlgorithm) -> Result<ObjectId, HashError> {
        Hasher::hash_object(algo, self.kind().as_str(), &self.encode_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        for kind in [ObjectKind::Blob, ObjectKind::Tree, ObjectKind::Commit] {
            assert_eq!(kind.as_str().parse::<ObjectKind>().unwrap(), kind);
        }
        assert!(matches!(
            "tag".parse::<ObjectKind>(),
            Err(ObjectError::InvalidKind(_))
        ));
    }

    #[test]
    fn framed_blob_roundtrip() {
        let obj = Object::Blob(Blob::new(b"metadata".to_vec()));
        let bytes = obj.encode();
        assert_eq!(&bytes[..7], b"blob 8\0");
        assert_eq!(Object::parse(&bytes, HashAlgorithm::Sha1).unwrap(), obj);
    }

    #[test]
    fn size_mismatch_is_truncation() {
        let err = Object::parse(b"blob 10\0short", HashAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, ObjectError::Truncated { expected: 10, actual: 5 }));
    }

    #[test]
    fn empty_tree_oid() {
        let oid = Object::Tree(Tree::new())
            .compute_oid(HashAlgorithm::Sha1)
            .unwrap();
        assert_eq!(oid.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }
}
