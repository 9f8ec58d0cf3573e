use std::fmt;
use std::path::{Path, PathBuf};

use mdgraph_hash::hasher::Hasher;
use mdgraph_hash::HashAlgorithm;

const REMOTE_PREFIX: &str = "remote:";
const FILE_SCHEME: &str = "file://";

/// Where a realm lives.
///
/// Plain strings are local realms. A string starting with `remote:` or
/// carrying a URL scheme (`file://`, `ssh://`, …) names a remote realm whose
/// objects are fetched into a local cache before they are read.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Realm {
    location: String,
    remote: bool,
}

impl Realm {
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        let remote = location.starts_with(REMOTE_PREFIX) || location.contains("://");
        Self { location, remote }
    }

    /// A local realm rooted at `path`.
    pub fn local(path: impl AsRef<Path>) -> Self {
        Self {
            location: path.as_ref().to_string_lossy().into_owned(),
            remote: false,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Filesystem path of the realm, if it has one.
    ///
    /// Local realms always do; remote realms only when addressed as
    /// `remote:<path>` or `file://<path>`.
    pub fn path(&self) -> Option<PathBuf> {
        if !self.remote {
            return Some(PathBuf::from(&self.location));
        }
        if let Some(rest) = self.location.strip_prefix(REMOTE_PREFIX) {
            if !rest.contains("://") {
                return Some(PathBuf::from(rest));
            }
            return Realm::new(rest).path();
        }
        self.location.strip_prefix(FILE_SCHEME).map(PathBuf::from)
    }

    /// Stable, filesystem-safe name for this realm's local cache.
    pub fn cache_key(&self) -> String {
        let readable: String = self
            .location
            .chars()
            .rev()
            .take(24)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let digest = Hasher::digest(HashAlgorithm::Sha1, self.location.as_bytes())
            .map(|oid| oid.short(12))
            .unwrap_or_default();
        format!("{digest}-{readable}")
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Realm({}{})", if self.remote { "remote " } else { "" }, self.location)
    }
}

impl From<&str> for Realm {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Realm {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for Realm {
    fn from(p: &Path) -> Self {
        Self::local(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(!Realm::new("/data/ds1/.git").is_remote());
        assert!(Realm::new("remote:/mnt/other/.git").is_remote());
        assert!(Realm::new("ssh://host/ds.git").is_remote());
        assert!(Realm::new("file:///srv/ds.git").is_remote());
    }

    #[test]
    fn paths() {
        assert_eq!(Realm::new("/a/b").path(), Some(PathBuf::from("/a/b")));
        assert_eq!(Realm::new("remote:/mnt/x").path(), Some(PathBuf::from("/mnt/x")));
        assert_eq!(Realm::new("file:///srv/x").path(), Some(PathBuf::from("/srv/x")));
        assert_eq!(Realm::new("remote:file:///srv/x").path(), Some(PathBuf::from("/srv/x")));
        assert_eq!(Realm::new("https://example.org/x").path(), None);
    }

    #[test]
    fn cache_keys_are_distinct_and_safe() {
        let a = Realm::new("remote:/mnt/a/.git").cache_key();
        let b = Realm::new("remote:/mnt/b/.git").cache_key();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }
}
