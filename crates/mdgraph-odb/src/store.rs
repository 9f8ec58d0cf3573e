use bstr::{BString, ByteVec};
use mdgraph_hash::{HashAlgorithm, ObjectId};
use mdgraph_object::{Blob, Commit, EntryKind, FileMode, Object, ObjectKind, Tree, TreeEntry};
use tracing::debug;

use crate::{OdbError, Realm, RealmLock};

/// A leaf found by [`ObjectStore::read_tree_recursive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    /// Slash-joined path from the listed root.
    pub path: BString,
    pub mode: FileMode,
    pub oid: ObjectId,
}

impl ListedEntry {
    pub fn kind(&self) -> EntryKind {
        self.mode.kind()
    }
}

/// Content-addressed storage for one or more realms.
///
/// Backends implement the raw primitives; the typed accessors, remote
/// caching and recursive listing are provided on top of them.
///
/// Invariants every backend upholds:
/// - writing identical content twice yields the same id and is harmless;
/// - objects are immutable once written;
/// - named pointers are updated atomically.
pub trait ObjectStore: Send + Sync {
    /// Digest algorithm used for ids in this store.
    fn hash_algo(&self) -> HashAlgorithm;

    /// Read an object from exactly `realm`, without remote caching.
    fn load_object(&self, realm: &Realm, oid: &ObjectId) -> Result<Option<Object>, OdbError>;

    /// Write an object into exactly `realm`.
    fn store_object(&self, realm: &Realm, object: &Object) -> Result<ObjectId, OdbError>;

    /// Whether `realm` holds `oid`, without remote caching.
    fn contains_object(&self, realm: &Realm, oid: &ObjectId) -> Result<bool, OdbError>;

    fn read_named_pointer(&self, realm: &Realm, name: &str) -> Result<Option<ObjectId>, OdbError>;

    fn update_named_pointer(&self, realm: &Realm, name: &str, oid: &ObjectId) -> Result<(), OdbError>;

    /// Remove a pointer. Returns whether it existed.
    fn delete_named_pointer(&self, realm: &Realm, name: &str) -> Result<bool, OdbError>;

    /// All pointers whose name starts with `prefix`, sorted by name.
    fn list_named_pointers(&self, realm: &Realm, prefix: &str) -> Result<Vec<(String, ObjectId)>, OdbError>;

    /// Take the advisory single-writer lock for `realm`.
    fn lock_realm(&self, realm: &Realm) -> Result<RealmLock, OdbError>;

    /// Local realm that caches objects fetched from `remote`.
    fn remote_cache(&self, remote: &Realm) -> Result<Realm, OdbError>;

    /// Realm to read `oid` from: `realm` itself if local, otherwise the
    /// local cache of the remote, populated on first access.
    fn readable_realm(&self, realm: &Realm, oid: &ObjectId) -> Result<Realm, OdbError> {
        if !realm.is_remote() {
            return Ok(realm.clone());
        }
        let cache = self.remote_cache(realm)?;
        if !self.contains_object(&cache, oid)? {
            self.fetch_remote(&cache, realm, oid)?;
        }
        Ok(cache)
    }

    /// Read any object. Fails with `NotFound` if it is absent.
    fn read_object(&self, realm: &Realm, oid: &ObjectId) -> Result<Object, OdbError> {
        let source = self.readable_realm(realm, oid)?;
        self.load_object(&source, oid)?
            .ok_or_else(|| OdbError::NotFound {
                realm: realm.to_string(),
                oid: *oid,
            })
    }

    fn write_object(&self, realm: &Realm, object: &Object) -> Result<ObjectId, OdbError> {
        if realm.is_remote() {
            return Err(OdbError::ReadOnlyRemote(realm.to_string()));
        }
        self.store_object(realm, object)
    }

    fn exists(&self, realm: &Realm, oid: &ObjectId) -> Result<bool, OdbError> {
        if realm.is_remote() {
            let cache = self.remote_cache(realm)?;
            if self.contains_object(&cache, oid)? {
                return Ok(true);
            }
        }
        self.contains_object(realm, oid)
    }

    fn read_blob(&self, realm: &Realm, oid: &ObjectId) -> Result<Vec<u8>, OdbError> {
        match self.read_object(realm, oid)? {
            Object::Blob(blob) => Ok(blob.data),
            other => Err(unexpected(oid, ObjectKind::Blob, &other)),
        }
    }

    fn write_blob(&self, realm: &Realm, data: &[u8]) -> Result<ObjectId, OdbError> {
        self.write_object(realm, &Object::Blob(Blob::new(data.to_vec())))
    }

    fn read_tree(&self, realm: &Realm, oid: &ObjectId) -> Result<Tree, OdbError> {
        match self.read_object(realm, oid)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(unexpected(oid, ObjectKind::Tree, &other)),
        }
    }

    fn write_tree(&self, realm: &Realm, tree: &Tree) -> Result<ObjectId, OdbError> {
        self.write_object(realm, &Object::Tree(tree.clone()))
    }

    fn read_commit(&self, realm: &Realm, oid: &ObjectId) -> Result<Commit, OdbError> {
        match self.read_object(realm, oid)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(unexpected(oid, ObjectKind::Commit, &other)),
        }
    }

    fn write_commit(&self, realm: &Realm, commit: &Commit) -> Result<ObjectId, OdbError> {
        self.write_object(realm, &Object::Commit(commit.clone()))
    }

    /// Every non-directory entry below `oid`, depth first, with full paths.
    fn read_tree_recursive(&self, realm: &Realm, oid: &ObjectId) -> Result<Vec<ListedEntry>, OdbError> {
        let mut out = Vec::new();
        let mut pending = vec![(BString::from(""), *oid)];
        while let Some((prefix, tree_oid)) = pending.pop() {
            let tree = self.read_tree(realm, &tree_oid)?;
            // Reverse so the stack pops entries in canonical order.
            for entry in tree.entries().iter().rev() {
                let path = join(&prefix, entry);
                if entry.mode.is_tree() {
                    pending.push((path, entry.oid));
                } else {
                    out.push(ListedEntry {
                        path,
                        mode: entry.mode,
                        oid: entry.oid,
                    });
                }
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    /// Copy `oid` and everything reachable from it from `remote` into
    /// `local`. Objects already present in `local` are assumed to have
    /// their closure present too.
    fn fetch_remote(&self, local: &Realm, remote: &Realm, oid: &ObjectId) -> Result<(), OdbError> {
        debug!(local = %local, remote = %remote, oid = %oid, "fetching object closure");
        let mut copied = 0usize;
        copy_closure(self, local, remote, oid, &mut copied)?;
        debug!(copied, "fetch complete");
        Ok(())
    }
}

fn copy_closure<S: ObjectStore + ?Sized>(
    store: &S,
    local: &Realm,
    remote: &Realm,
    oid: &ObjectId,
    copied: &mut usize,
) -> Result<(), OdbError> {
    if store.contains_object(local, oid)? {
        return Ok(());
    }
    let object = store
        .load_object(remote, oid)?
        .ok_or_else(|| OdbError::NotFound {
            realm: remote.to_string(),
            oid: *oid,
        })?;
    // Children first, so a present object always implies a present closure.
    match &object {
        Object::Blob(_) => {}
        Object::Tree(tree) => {
            for entry in tree.iter().filter(|e| e.kind() != EntryKind::Commit) {
                copy_closure(store, local, remote, &entry.oid, copied)?;
            }
        }
        Object::Commit(commit) => {
            copy_closure(store, local, remote, &commit.tree, copied)?;
            for parent in &commit.parents {
                copy_closure(store, local, remote, parent, copied)?;
            }
        }
    }
    let written = store.store_object(local, &object)?;
    if written != *oid {
        return Err(OdbError::Corrupt {
            oid: *oid,
            reason: format!("remote object re-hashes to {written}"),
        });
    }
    *copied += 1;
    Ok(())
}

fn join(prefix: &BString, entry: &TreeEntry) -> BString {
    let mut path = prefix.clone();
    if !path.is_empty() {
        path.push_byte(b'/');
    }
    path.push_str(&entry.name);
    path
}

fn unexpected(oid: &ObjectId, expected: ObjectKind, actual: &Object) -> OdbError {
    OdbError::UnexpectedKind {
        oid: *oid,
        expected,
        actual: actual.kind(),
    }
}

/// Check a pointer name: `refs/…`, no empty, `.` or `..` components, no
/// `.lock` suffix.
pub(crate) fn validate_pointer_name(name: &str) -> Result<(), OdbError> {
    let invalid = || OdbError::InvalidPointerName(name.to_string());
    let rest = name.strip_prefix("refs/").ok_or_else(invalid)?;
    if rest.is_empty() || name.ends_with(".lock") {
        return Err(invalid());
    }
    for component in rest.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(invalid());
        }
        if component.bytes().any(|b| b < 0x20 || b"\\:?*[~^ ".contains(&b)) {
            return Err(invalid());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_names() {
        assert!(validate_pointer_name("refs/mdgraph/uuid-set").is_ok());
        assert!(validate_pointer_name("refs/mdgraph/objects/ab12").is_ok());
        for bad in ["HEAD", "refs/", "refs//x", "refs/a/../b", "refs/x.lock", "refs/a b", "refs/a:b"] {
            assert!(
                matches!(validate_pointer_name(bad), Err(OdbError::InvalidPointerName(_))),
                "{bad} accepted"
            );
        }
    }
}
