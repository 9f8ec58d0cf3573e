use std::cmp::Ordering;

use bstr::{BStr, BString, ByteSlice};
use mdgraph_hash::{HashAlgorithm, ObjectId};

use crate::ObjectError;

/// Mode recorded for a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// 100644
    Regular,
    /// 100755
    Executable,
    /// 120000
    Symlink,
    /// 160000, a link to a commit in another repository
    Gitlink,
    /// 40000
    Tree,
    /// Anything else, kept so foreign trees re-encode byte-identically.
    Unknown(u32),
}

impl FileMode {
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        let raw = parse_octal(s)
            .ok_or_else(|| ObjectError::InvalidFileMode(String::from_utf8_lossy(s).into()))?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            0o040000 => Self::Tree,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Tree => 0o040000,
            Self::Unknown(v) => *v,
        }
    }

    /// Octal ASCII without leading zeros, so trees encode as `40000`.
    pub fn to_octal(&self) -> String {
        format!("{:o}", self.raw())
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Tree => EntryKind::Tree,
            Self::Gitlink => EntryKind::Commit,
            _ => EntryKind::Blob,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }
}

fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.iter().try_fold(0u32, |acc, &b| {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        acc.checked_mul(8)?.checked_add(u32::from(b - b'0'))
    })
}

/// Object kind a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(mode, kind, hash, name)` row of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: BString,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: FileMode, name: impl Into<BString>, oid: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            oid,
        }
    }

    /// A regular-file entry.
    pub fn file(name: impl Into<BString>, oid: ObjectId) -> Self {
        Self::new(FileMode::Regular, name, oid)
    }

    /// A subdirectory entry.
    pub fn directory(name: impl Into<BString>, oid: ObjectId) -> Self {
        Self::new(FileMode::Tree, name, oid)
    }

    pub fn kind(&self) -> EntryKind {
        self.mode.kind()
    }

    /// Canonical entry order.
    ///
    /// After the common prefix a directory name behaves as if it ended in
    /// `/`. So directory `foo` sorts after `foo-bar` and `foo.c` but before
    /// `foo0`, while file `foo` sorts before all three.
    pub fn canonical_cmp(a: &TreeEntry, b: &TreeEntry) -> Ordering {
        name_compare(&a.name, a.mode.is_tree(), &b.name, b.mode.is_tree())
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::canonical_cmp(self, other)
    }
}

fn name_compare(a: &[u8], a_is_dir: bool, b: &[u8], b_is_dir: bool) -> Ordering {
    let common = a.len().min(b.len());
    match a[..common].cmp(&b[..common]) {
        Ordering::Equal => {}
        other => return other,
    }
    let terminator = |name: &[u8], is_dir: bool| match name.get(common) {
        Some(&c) => c,
        None if is_dir => b'/',
        None => 0,
    };
    terminator(a, a_is_dir).cmp(&terminator(b, b_is_dir))
}

/// A directory listing, kept in canonical order at all times so that equal
/// listings compare equal and encode to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries in any order. Later entries replace earlier ones
    /// with the same name.
    pub fn from_entries(entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        let mut tree = Self::new();
        for entry in entries {
            tree.upsert(entry);
        }
        tree
    }

    /// Decode a tree payload: repeated `"<mode> <name>\0<raw-id>"`.
    pub fn parse(payload: &[u8], algo: HashAlgorithm) -> Result<Self, ObjectError> {
        let id_len = algo.digest_len();
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < payload.len() {
            let space = payload[pos..]
                .find_byte(b' ')
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "missing space after mode".into(),
                })?
                + pos;
            let mode = FileMode::from_bytes(&payload[pos..space]).map_err(|_| {
                ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "invalid mode".into(),
                }
            })?;

            let name_start = space + 1;
            let nul = payload[name_start..]
                .find_byte(0)
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "missing NUL after name".into(),
                })?
                + name_start;
            if nul == name_start {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "empty name".into(),
                });
            }

            let id_start = nul + 1;
            if id_start + id_len > payload.len() {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: id_start,
                    reason: "truncated object id".into(),
                });
            }
            let oid = ObjectId::from_bytes(&payload[id_start..id_start + id_len], algo)?;

            entries.push(TreeEntry::new(mode, &payload[name_start..nul], oid));
            pos = id_start + id_len;
        }

        entries.sort();
        Ok(Self { entries })
    }

    /// Encode the payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.to_octal().as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    /// Insert or replace the entry with the same name. Returns the replaced
    /// entry, if any.
    pub fn upsert(&mut self, entry: TreeEntry) -> Option<TreeEntry> {
        let previous = self.remove(entry.name.as_bstr());
        let at = self.entries.partition_point(|e| e < &entry);
        self.entries.insert(at, entry);
        previous
    }

    pub fn remove(&mut self, name: &BStr) -> Option<TreeEntry> {
        let idx = self.entries.iter().position(|e| e.name.as_bstr() == name)?;
        Some(self.entries.remove(idx))
    }

    pub fn find(&self, name: &BStr) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name.as_bstr() == name)
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<TreeEntry> for Tree {
    fn from_iter<I: IntoIterator<Item = TreeEntry>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}
