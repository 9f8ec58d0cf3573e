//! Reachability index: a tree under [`REACHABLE`] that links objects no
//! root refers to yet, so collection never drops them.
//!
//! Entries are fanned out like loose objects, `ab/cdef…`, each pointing at
//! the protected object with a mode matching its kind.

use std::collections::BTreeMap;

use bstr::BStr;
use mdgraph_hash::ObjectId;
use mdgraph_merge::{MergeStats, PathInfo, PathKind};
use mdgraph_object::{EntryKind, ObjectKind};

use crate::{RealmError, Repository, REACHABLE};

fn index_path(oid: &ObjectId) -> String {
    let hex = oid.to_hex();
    format!("{}/{}", &hex[..2], &hex[2..])
}

pub(crate) fn path_kind(kind: ObjectKind) -> PathKind {
    match kind {
        ObjectKind::Blob => PathKind::File,
        ObjectKind::Tree => PathKind::Directory,
        ObjectKind::Commit => PathKind::Commit,
    }
}

impl Repository {
    /// Add objects to the reachability index.
    pub fn protect(&self, objects: impl IntoIterator<Item = (ObjectId, ObjectKind)>) -> Result<MergeStats, RealmError> {
        let objects: Vec<_> = objects.into_iter().collect();
        self.locked(|| self.protect_locked(objects))
    }

    pub(crate) fn protect_locked(
        &self,
        objects: impl IntoIterator<Item = (ObjectId, ObjectKind)>,
    ) -> Result<MergeStats, RealmError> {
        // One entry per id; the batch must not name a leaf twice.
        let unique: BTreeMap<ObjectId, ObjectKind> = objects.into_iter().collect();
        let batch = unique
            .iter()
            .map(|(oid, kind)| PathInfo::new(&index_path(oid), *oid, path_kind(*kind)))
            .collect::<Result<Vec<_>, _>>()?;
        let (_, stats) = self.update_tree_locked(REACHABLE, batch)?;
        Ok(stats)
    }

    /// Whether `oid` is in the reachability index.
    pub fn is_protected(&self, oid: &ObjectId) -> Result<bool, RealmError> {
        let Some(root) = self.root(REACHABLE)? else {
            return Ok(false);
        };
        let hex = oid.to_hex();
        let fan_out = self.store().read_tree(self.realm(), &root)?;
        let Some(dir) = fan_out.find(BStr::new(&hex[..2])) else {
            return Ok(false);
        };
        if !dir.mode.is_tree() {
            return Ok(false);
        }
        let entries = self.store().read_tree(self.realm(), &dir.oid)?;
        Ok(entries.find(BStr::new(&hex[2..])).is_some())
    }

    /// Every protected object, by id.
    pub fn protected(&self) -> Result<Vec<(ObjectId, ObjectKind)>, RealmError> {
        let Some(root) = self.root(REACHABLE)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for dir in self.store().read_tree(self.realm(), &root)?.iter() {
            for entry in self.store().read_tree(self.realm(), &dir.oid)?.iter() {
                let kind = match entry.kind() {
                    EntryKind::Blob => ObjectKind::Blob,
                    EntryKind::Tree => ObjectKind::Tree,
                    EntryKind::Commit => ObjectKind::Commit,
                };
                out.push((entry.oid, kind));
            }
        }
        out.sort_by_key(|(oid, _)| *oid);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_path() {
        let oid = ObjectId::from_hex("95d09f2b10159347eece71399a7e2e907ea3df4f").unwrap();
        assert_eq!(index_path(&oid), "95/d09f2b10159347eece71399a7e2e907ea3df4f");
    }
}
