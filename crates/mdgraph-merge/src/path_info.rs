use std::fmt;

use mdgraph_hash::ObjectId;
use mdgraph_object::FileMode;

use crate::MergeError;

/// What a batch entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// A blob.
    File,
    /// An already persisted tree.
    Directory,
    /// A commit, recorded as a gitlink entry.
    Commit,
}

impl PathKind {
    pub fn mode(self) -> FileMode {
        match self {
            PathKind::File => FileMode::Regular,
            PathKind::Directory => FileMode::Tree,
            PathKind::Commit => FileMode::Gitlink,
        }
    }
}

/// One insertion in a merge batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub segments: Vec<String>,
    pub content_hash: ObjectId,
    pub kind: PathKind,
}

impl PathInfo {
    /// Entry for a slash-delimited `path`, canonicalized.
    pub fn new(path: &str, content_hash: ObjectId, kind: PathKind) -> Result<Self, MergeError> {
        let segments: Vec<String> = mdgraph_tree::segments(path)
            .map_err(|_| MergeError::InvalidPath {
                path: path.to_string(),
                reason: "not a canonical relative path",
            })?
            .into_iter()
            .map(str::to_owned)
            .collect();
        let info = Self {
            segments,
            content_hash,
            kind,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn file(path: &str, content_hash: ObjectId) -> Result<Self, MergeError> {
        Self::new(path, content_hash, PathKind::File)
    }

    pub fn directory(path: &str, content_hash: ObjectId) -> Result<Self, MergeError> {
        Self::new(path, content_hash, PathKind::Directory)
    }

    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Check that every segment is a usable tree entry name.
    pub(crate) fn validate(&self) -> Result<(), MergeError> {
        let invalid = |reason| MergeError::InvalidPath {
            path: self.path(),
            reason,
        };
        if self.segments.is_empty() {
            return Err(invalid("empty path"));
        }
        for seg in &self.segments {
            if seg.is_empty() || seg == "." || seg == ".." {
                return Err(invalid("reserved segment name"));
            }
            if seg.contains('/') || seg.contains('\0') {
                return Err(invalid("segment contains '/' or NUL"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PathInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PathKind::File => "file",
            PathKind::Directory => "dir",
            PathKind::Commit => "commit",
        };
        write!(f, "{} {} {}", kind, self.content_hash, self.path())
    }
}
