//! One realm of metadata roots, updated by a single writer at a time.
//!
//! [`Repository`] ties a store and a realm together. Roots are named
//! pointers to trees; every update of a root runs inside the realm lock as
//! read root, merge, then publish the new root.

mod config;
mod error;
pub mod migrate;
mod reachable;

pub use config::{AuthorConfig, RealmConfig};
pub use error::RealmError;

use std::path::Path;
use std::sync::Arc;

use bstr::BString;
use mdgraph_hash::ObjectId;
use mdgraph_mapper::{CodecRegistry, Connector, Mapper, Reference};
use mdgraph_merge::{merge_paths, MergeStats, PathInfo};
use mdgraph_object::{Commit, Signature};
use mdgraph_odb::{LooseStore, ObjectStore, Realm};
use tracing::{debug, info};

/// Root of the per-dataset version trees.
pub const TREE_VERSION_LIST: &str = "refs/mdgraph/tree-version-list";
/// Root of the UUID-keyed version sets.
pub const UUID_SET: &str = "refs/mdgraph/uuid-set";
/// Tree protecting objects that no root links to yet.
pub const REACHABLE: &str = "refs/mdgraph/reachable";
/// Blob holding the realm format version.
pub const FORMAT: &str = "refs/mdgraph/format";

const HISTORY_PREFIX: &str = "refs/mdgraph/history/";

pub struct Repository {
    store: Arc<dyn ObjectStore>,
    realm: Realm,
    config: RealmConfig,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("realm", &self.realm)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Create (or reopen) an on-disk realm at `path`.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RealmError> {
        let path = path.as_ref();
        let config = RealmConfig::load_from_dir(path)?;
        let store = LooseStore::new(config.store.clone());
        let realm = Realm::local(path);
        store.init(&realm)?;
        let repo = Self::with_store(Arc::new(store), realm, config);
        migrate::stamp_if_fresh(&repo)?;
        info!(realm = %repo.realm, "initialized repository");
        Ok(repo)
    }

    /// Open an existing on-disk realm.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RealmError> {
        let path = path.as_ref();
        if !path.join("objects").is_dir() {
            return Err(RealmError::NotFound(path.to_path_buf()));
        }
        let config = RealmConfig::load_from_dir(path)?;
        let store = LooseStore::new(config.store.clone());
        Ok(Self::with_store(Arc::new(store), Realm::local(path), config))
    }

    /// Repository over any store, e.g. a `MemoryStore`.
    pub fn with_store(store: Arc<dyn ObjectStore>, realm: Realm, config: RealmConfig) -> Self {
        Self { store, realm, config }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    /// Run `f` while holding the realm lock.
    pub(crate) fn locked<T>(&self, f: impl FnOnce() -> Result<T, RealmError>) -> Result<T, RealmError> {
        let _lock = self.store.lock_realm(&self.realm)?;
        f()
    }

    /// Current tree behind `pointer`.
    pub fn root(&self, pointer: &str) -> Result<Option<ObjectId>, RealmError> {
        Ok(self.store.read_named_pointer(&self.realm, pointer)?)
    }

    /// Merge `batch` into the tree behind `pointer` and publish the result.
    ///
    /// On any error the pointer keeps its previous value.
    pub fn update_tree(
        &self,
        pointer: &str,
        batch: impl IntoIterator<Item = PathInfo>,
    ) -> Result<(ObjectId, MergeStats), RealmError> {
        self.locked(|| self.update_tree_locked(pointer, batch))
    }

    pub(crate) fn update_tree_locked(
        &self,
        pointer: &str,
        batch: impl IntoIterator<Item = PathInfo>,
    ) -> Result<(ObjectId, MergeStats), RealmError> {
        let old = self.root(pointer)?;
        let (new, stats) = merge_paths(self.store(), &self.realm, old, batch)?;
        if old != Some(new) {
            self.store.update_named_pointer(&self.realm, pointer, &new)?;
        }
        info!(
            realm = %self.realm,
            pointer,
            root = %new,
            reads = stats.trees_read,
            writes = stats.trees_written,
            "updated root"
        );
        Ok((new, stats))
    }

    /// Mapper over this repository's store, defaulting to this realm.
    pub fn mapper<V>(&self, registry: CodecRegistry<V>) -> Mapper<V> {
        Mapper::new(Arc::clone(&self.store), registry).with_default_realm(self.realm.clone())
    }

    /// Unmapped connector for the value behind `pointer`, or a
    /// none-connector when the pointer is unset.
    pub fn load_root<V>(&self, pointer: &str, type_tag: &str) -> Result<Connector<V>, RealmError> {
        Ok(match self.root(pointer)? {
            Some(oid) => Connector::from_reference(Reference::new(type_tag, oid), Some(self.realm.clone())),
            None => Connector::none(type_tag),
        })
    }

    /// Save `connector` into this realm and point `pointer` at it. A
    /// none-value removes the pointer.
    pub fn save_root<V>(
        &self,
        mapper: &Mapper<V>,
        pointer: &str,
        connector: &mut Connector<V>,
    ) -> Result<Reference, RealmError> {
        self.locked(|| {
            let reference = connector.save_to(mapper, &self.realm, false)?;
            match &reference.location {
                Some(oid) => self.store.update_named_pointer(&self.realm, pointer, oid)?,
                None => {
                    self.store.delete_named_pointer(&self.realm, pointer)?;
                }
            }
            debug!(realm = %self.realm, pointer, reference = %reference, "saved root");
            Ok(reference)
        })
    }

    /// Record the current tree behind `pointer` as a commit on that
    /// pointer's history, optionally linked to an external commit.
    pub fn record_snapshot(
        &self,
        pointer: &str,
        message: &str,
        source_commit: Option<&str>,
    ) -> Result<ObjectId, RealmError> {
        self.locked(|| {
            let tree = self
                .root(pointer)?
                .ok_or_else(|| RealmError::NoRoot(pointer.to_string()))?;
            let history = history_pointer(pointer);
            let parent = self.store.read_named_pointer(&self.realm, &history)?;

            let author = Signature::now(self.config.author.name.as_str(), self.config.author.email.as_str());
            let mut commit = Commit::new(tree, author, format!("{message}\n"));
            commit.parents.extend(parent);
            commit.source_commit = source_commit.map(BString::from);

            let oid = self.store.write_commit(&self.realm, &commit)?;
            self.store.update_named_pointer(&self.realm, &history, &oid)?;
            info!(realm = %self.realm, pointer, commit = %oid, "recorded snapshot");
            Ok(oid)
        })
    }

    /// Snapshots of `pointer`, newest first.
    pub fn history(&self, pointer: &str) -> Result<Vec<(ObjectId, Commit)>, RealmError> {
        let mut out = Vec::new();
        let mut next = self.store.read_named_pointer(&self.realm, &history_pointer(pointer))?;
        while let Some(oid) = next {
            let commit = self.store.read_commit(&self.realm, &oid)?;
            next = commit.parents.first().copied();
            out.push((oid, commit));
        }
        Ok(out)
    }
}

fn history_pointer(pointer: &str) -> String {
    format!("{HISTORY_PREFIX}{}", pointer.strip_prefix("refs/").unwrap_or(pointer))
}
