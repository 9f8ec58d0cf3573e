use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use mdgraph_hash::{HashAlgorithm, ObjectId};
use mdgraph_object::{Object, ObjectKind};

use crate::lock::HeldRealms;
use crate::store::validate_pointer_name;
use crate::{ObjectStore, OdbError, Realm, RealmLock};

/// One object-level I/O operation seen by a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoEvent {
    Read(ObjectKind, ObjectId),
    Write(ObjectKind, ObjectId),
}

/// Log of object reads and writes, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoStats {
    pub events: Vec<IoEvent>,
}

impl IoStats {
    pub fn reads(&self) -> impl Iterator<Item = (ObjectKind, ObjectId)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            IoEvent::Read(kind, oid) => Some((kind, oid)),
            IoEvent::Write(..) => None,
        })
    }

    pub fn writes(&self) -> impl Iterator<Item = (ObjectKind, ObjectId)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            IoEvent::Write(kind, oid) => Some((kind, oid)),
            IoEvent::Read(..) => None,
        })
    }

    pub fn tree_reads(&self) -> usize {
        self.reads().filter(|(k, _)| *k == ObjectKind::Tree).count()
    }

    pub fn tree_writes(&self) -> usize {
        self.writes().filter(|(k, _)| *k == ObjectKind::Tree).count()
    }

    pub fn was_read(&self, oid: &ObjectId) -> bool {
        self.reads().any(|(_, o)| o == *oid)
    }

    pub fn was_written(&self, oid: &ObjectId) -> bool {
        self.writes().any(|(_, o)| o == *oid)
    }
}

#[derive(Default)]
struct RealmData {
    objects: HashMap<ObjectId, Object>,
    pointers: BTreeMap<String, ObjectId>,
}

/// In-process store holding any number of realms.
///
/// Every `load_object`/`store_object` call is recorded, including writes of
/// content that was already present, so tests can assert exactly which
/// objects an operation touched.
pub struct MemoryStore {
    algo: HashAlgorithm,
    realms: RwLock<HashMap<Realm, RealmData>>,
    stats: Mutex<IoStats>,
    held: HeldRealms,
    lock_timeout: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::default())
    }

    pub fn with_algorithm(algo: HashAlgorithm) -> Self {
        Self {
            algo,
            realms: RwLock::new(HashMap::new()),
            stats: Mutex::new(IoStats::default()),
            held: HeldRealms::default(),
            lock_timeout: Duration::ZERO,
        }
    }

    /// Wait up to `timeout` for a held realm lock instead of failing at once.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Snapshot of the I/O log.
    pub fn stats(&self) -> IoStats {
        self.io_log().clone()
    }

    /// Return the I/O log and start a fresh one.
    pub fn take_stats(&self) -> IoStats {
        std::mem::take(&mut *self.io_log())
    }

    pub fn reset_stats(&self) {
        self.io_log().events.clear();
    }

    /// Number of objects held by `realm`.
    pub fn object_count(&self, realm: &Realm) -> usize {
        self.realms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(realm)
            .map_or(0, |data| data.objects.len())
    }

    fn record(&self, event: IoEvent) {
        self.io_log().events.push(event);
    }

    // The log is append-only, so a poisoned one is still consistent.
    fn io_log(&self) -> MutexGuard<'_, IoStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_realms(&self) -> Result<RwLockReadGuard<'_, HashMap<Realm, RealmData>>, OdbError> {
        self.realms.read().map_err(|_| OdbError::Poisoned("realm map"))
    }

    fn write_realms(&self) -> Result<RwLockWriteGuard<'_, HashMap<Realm, RealmData>>, OdbError> {
        self.realms.write().map_err(|_| OdbError::Poisoned("realm map"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn hash_algo(&self) -> HashAlgorithm {
        self.algo
    }

    fn load_object(&self, realm: &Realm, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        let object = self
            .read_realms()?
            .get(realm)
            .and_then(|data| data.objects.get(oid).cloned());
        if let Some(object) = &object {
            self.record(IoEvent::Read(object.kind(), *oid));
        }
        Ok(object)
    }

    fn store_object(&self, realm: &Realm, object: &Object) -> Result<ObjectId, OdbError> {
        let oid = object.compute_oid(self.algo)?;
        self.write_realms()?
            .entry(realm.clone())
            .or_default()
            .objects
            .entry(oid)
            .or_insert_with(|| object.clone());
        self.record(IoEvent::Write(object.kind(), oid));
        Ok(oid)
    }

    fn contains_object(&self, realm: &Realm, oid: &ObjectId) -> Result<bool, OdbError> {
        Ok(self
            .read_realms()?
            .get(realm)
            .is_some_and(|data| data.objects.contains_key(oid)))
    }

    fn read_named_pointer(&self, realm: &Realm, name: &str) -> Result<Option<ObjectId>, OdbError> {
        validate_pointer_name(name)?;
        Ok(self
            .read_realms()?
            .get(realm)
            .and_then(|data| data.pointers.get(name).copied()))
    }

    fn update_named_pointer(&self, realm: &Realm, name: &str, oid: &ObjectId) -> Result<(), OdbError> {
        validate_pointer_name(name)?;
        if realm.is_remote() {
            return Err(OdbError::ReadOnlyRemote(realm.to_string()));
        }
        self.write_realms()?
            .entry(realm.clone())
            .or_default()
            .pointers
            .insert(name.to_string(), *oid);
        Ok(())
    }

    fn delete_named_pointer(&self, realm: &Realm, name: &str) -> Result<bool, OdbError> {
        validate_pointer_name(name)?;
        Ok(self
            .write_realms()?
            .get_mut(realm)
            .is_some_and(|data| data.pointers.remove(name).is_some()))
    }

    fn list_named_pointers(&self, realm: &Realm, prefix: &str) -> Result<Vec<(String, ObjectId)>, OdbError> {
        Ok(self
            .read_realms()?
            .get(realm)
            .map(|data| {
                data.pointers
                    .range(prefix.to_string()..)
                    .take_while(|(name, _)| name.starts_with(prefix))
                    .map(|(name, oid)| (name.clone(), *oid))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn lock_realm(&self, realm: &Realm) -> Result<RealmLock, OdbError> {
        RealmLock::in_process(&self.held, realm, self.lock_timeout)
    }

    fn remote_cache(&self, remote: &Realm) -> Result<Realm, OdbError> {
        Ok(Realm::new(format!("cache/{}", remote.cache_key())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdgraph_object::{Tree, TreeEntry};

    #[test]
    fn poisoned_realm_map_is_an_error() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let realm = Realm::new("r");
        let oid = store.write_blob(&realm, b"kept").unwrap();

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _realms = poisoner.realms.write().unwrap();
            panic!("writer died holding the realm map");
        })
        .join();

        assert!(matches!(store.read_blob(&realm, &oid), Err(OdbError::Poisoned(_))));
        assert!(matches!(store.write_blob(&realm, b"new"), Err(OdbError::Poisoned(_))));
        assert!(matches!(
            store.list_named_pointers(&realm, "refs/"),
            Err(OdbError::Poisoned(_))
        ));
        // The I/O log stays readable.
        assert_eq!(store.stats().writes().count(), 1);
    }

    #[test]
    fn write_is_idempotent_and_logged() {
        let store = MemoryStore::new();
        let realm = Realm::new("r");
        let a = store.write_blob(&realm, b"hello world").unwrap();
        let b = store.write_blob(&realm, b"hello world").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), "95d09f2b10159347eece71399a7e2e907ea3df4f");
        assert_eq!(store.object_count(&realm), 1);
        assert_eq!(store.stats().writes().count(), 2);
    }

    #[test]
    fn realms_are_isolated() {
        let store = MemoryStore::new();
        let a = Realm::new("a");
        let oid = store.write_blob(&a, b"x").unwrap();
        assert!(store.exists(&a, &oid).unwrap());
        assert!(!store.exists(&Realm::new("b"), &oid).unwrap());
        assert!(matches!(
            store.read_blob(&Realm::new("b"), &oid),
            Err(OdbError::NotFound { .. })
        ));
    }

    #[test]
    fn typed_read_checks_kind() {
        let store = MemoryStore::new();
        let realm = Realm::new("r");
        let oid = store.write_blob(&realm, b"x").unwrap();
        assert!(matches!(
            store.read_tree(&realm, &oid),
            Err(OdbError::UnexpectedKind {
                expected: ObjectKind::Tree,
                actual: ObjectKind::Blob,
                ..
            })
        ));
    }

    #[test]
    fn pointers_listed_by_prefix() {
        let store = MemoryStore::new();
        let realm = Realm::new("r");
        let oid = store.write_blob(&realm, b"x").unwrap();
        for name in ["refs/mdgraph/a", "refs/mdgraph/b", "refs/other/c"] {
            store.update_named_pointer(&realm, name, &oid).unwrap();
        }
        let listed: Vec<_> = store
            .list_named_pointers(&realm, "refs/mdgraph/")
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(listed, ["refs/mdgraph/a", "refs/mdgraph/b"]);
        assert!(store.delete_named_pointer(&realm, "refs/mdgraph/a").unwrap());
        assert!(!store.delete_named_pointer(&realm, "refs/mdgraph/a").unwrap());
        assert_eq!(store.read_named_pointer(&realm, "refs/mdgraph/a").unwrap(), None);
    }

    #[test]
    fn remote_reads_go_through_cache() {
        let store = MemoryStore::new();
        let remote = Realm::new("remote:upstream");
        // Populate the remote side directly; write_object refuses remotes.
        let blob = store
            .store_object(&remote, &Object::Blob(b"leaf".to_vec().into()))
            .unwrap();
        let tree = Tree::from_entries(vec![TreeEntry::file("leaf", blob)]);
        let tree_oid = store.store_object(&remote, &Object::Tree(tree)).unwrap();

        let cache = store.remote_cache(&remote).unwrap();
        assert!(!store.contains_object(&cache, &tree_oid).unwrap());

        let listed = store.read_tree_recursive(&remote, &tree_oid).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(store.contains_object(&cache, &tree_oid).unwrap());
        assert!(store.contains_object(&cache, &blob).unwrap());
        assert!(matches!(
            store.write_blob(&remote, b"nope"),
            Err(OdbError::ReadOnlyRemote(_))
        ));
    }

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let store = MemoryStore::new();
        let realm = Realm::new("r");
        let lock = store.lock_realm(&realm).unwrap();
        assert!(matches!(store.lock_realm(&realm), Err(OdbError::Locked { .. })));
        assert!(store.lock_realm(&Realm::new("other")).is_ok());
        drop(lock);
        assert!(store.lock_realm(&realm).is_ok());
    }
}
