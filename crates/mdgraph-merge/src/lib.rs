//! Merge a batch of path insertions into a persisted tree.
//!
//! Only directories on the path to an inserted entry are read, each at most
//! once, and only directories whose entry set actually changed are written.
//! Untouched siblings keep their recorded ids.

mod error;
mod path_info;

pub use error::MergeError;
pub use path_info::{PathInfo, PathKind};

use bstr::BStr;
use mdgraph_hash::ObjectId;
use mdgraph_object::{Tree, TreeEntry};
use mdgraph_odb::{ObjectStore, Realm};
use mdgraph_tree::{PathTree, TreeError, TreeNode};
use tracing::debug;

/// Object I/O performed by one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub trees_read: usize,
    pub trees_written: usize,
}

/// Applies batches of [`PathInfo`] to trees stored in one realm.
pub struct TreeMerger<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    realm: &'a Realm,
    stats: MergeStats,
}

impl<'a, S: ObjectStore + ?Sized> TreeMerger<'a, S> {
    pub fn new(store: &'a S, realm: &'a Realm) -> Self {
        Self {
            store,
            realm,
            stats: MergeStats::default(),
        }
    }

    /// Merge `batch` into the tree `root` (or the empty tree when `None`)
    /// and return the id of the resulting root tree.
    ///
    /// Conflicts are reported before anything reachable from the result is
    /// published; objects written before a failure are orphans.
    pub fn merge(
        &mut self,
        root: Option<ObjectId>,
        batch: impl IntoIterator<Item = PathInfo>,
    ) -> Result<ObjectId, MergeError> {
        let plan = build_plan(batch)?;
        let count = plan.len();
        if plan.is_empty() {
            return match root {
                Some(oid) => Ok(oid),
                None => {
                    self.stats.trees_written += 1;
                    Ok(self.store.write_tree(self.realm, &Tree::new())?)
                }
            };
        }

        let before = self.stats;
        let new_root = self.merge_level(root, plan.root(), "")?;
        debug!(
            realm = %self.realm,
            entries = count,
            reads = self.stats.trees_read - before.trees_read,
            writes = self.stats.trees_written - before.trees_written,
            root = %new_root,
            "merged batch"
        );
        Ok(new_root)
    }

    /// Totals across every merge run by this merger.
    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    fn merge_level(
        &mut self,
        existing: Option<ObjectId>,
        node: &TreeNode<PathInfo>,
        prefix: &str,
    ) -> Result<ObjectId, MergeError> {
        let mut tree = match existing {
            Some(oid) => {
                self.stats.trees_read += 1;
                self.store.read_tree(self.realm, &oid)?
            }
            None => Tree::new(),
        };
        let mut dirty = existing.is_none();

        for (name, child) in node.children() {
            let path = join(prefix, name);
            let current = tree.find(BStr::new(name)).cloned();

            let entry = match child.value() {
                Some(info) => {
                    match (info.kind, &current) {
                        (PathKind::File | PathKind::Commit, Some(e)) if e.mode.is_tree() => {
                            return Err(MergeError::FileOverDirectoryConflict { path });
                        }
                        (PathKind::Directory, Some(e)) if !e.mode.is_tree() => {
                            return Err(MergeError::DirectoryOverFileConflict { path });
                        }
                        _ => {}
                    }
                    TreeEntry::new(info.kind.mode(), name.as_str(), info.content_hash)
                }
                None => {
                    let child_existing = match &current {
                        Some(e) if e.mode.is_tree() => Some(e.oid),
                        Some(_) => return Err(MergeError::DirectoryOverFileConflict { path }),
                        None => None,
                    };
                    let oid = self.merge_level(child_existing, child, &path)?;
                    TreeEntry::directory(name.as_str(), oid)
                }
            };

            if current.as_ref() != Some(&entry) {
                tree.upsert(entry);
                dirty = true;
            }
        }

        match (dirty, existing) {
            (false, Some(oid)) => Ok(oid),
            _ => {
                self.stats.trees_written += 1;
                Ok(self.store.write_tree(self.realm, &tree)?)
            }
        }
    }
}

/// Merge `batch` into `root` in `realm`, returning the new root and the I/O
/// the merge performed.
pub fn merge_paths<S: ObjectStore + ?Sized>(
    store: &S,
    realm: &Realm,
    root: Option<ObjectId>,
    batch: impl IntoIterator<Item = PathInfo>,
) -> Result<(ObjectId, MergeStats), MergeError> {
    let mut merger = TreeMerger::new(store, realm);
    let oid = merger.merge(root, batch)?;
    Ok((oid, merger.stats()))
}

/// Load the batch into a path tree, rejecting names used inconsistently.
fn build_plan(batch: impl IntoIterator<Item = PathInfo>) -> Result<PathTree<PathInfo>, MergeError> {
    let mut plan = PathTree::new();
    for info in batch {
        info.validate()?;
        let path = info.path();
        match plan.insert_value(&path, info, false) {
            Ok(_) => {}
            Err(TreeError::ConflictingPathType { path }) => {
                return Err(MergeError::ConflictingNameUse { path });
            }
            Err(TreeError::PathAlreadyExists { path }) => {
                let leaf = plan.lookup(&path).is_some_and(|n| n.value().is_some());
                return Err(if leaf {
                    MergeError::DuplicateLeaf { path }
                } else {
                    MergeError::ConflictingNameUse { path }
                });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(plan)
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
