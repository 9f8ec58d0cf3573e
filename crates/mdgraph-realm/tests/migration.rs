use std::sync::Arc;

use mdgraph_hash::ObjectId;
use mdgraph_object::{ObjectKind, Tree, TreeEntry};
use mdgraph_odb::{MemoryStore, ObjectStore, Realm};
use mdgraph_realm::migrate::{self, CURRENT_VERSION};
use mdgraph_realm::{RealmConfig, RealmError, Repository, FORMAT, REACHABLE};

fn memory_repo() -> (Arc<MemoryStore>, Repository) {
    let store = Arc::new(MemoryStore::new());
    let repo = Repository::with_store(store.clone(), Realm::new("legacy"), RealmConfig::default());
    (store, repo)
}

fn seed_objects(store: &MemoryStore, realm: &Realm) -> (ObjectId, ObjectId) {
    let blob = store.write_blob(realm, b"unlinked").unwrap();
    let tree = store
        .write_tree(realm, &Tree::from_entries(vec![TreeEntry::file("f", blob)]))
        .unwrap();
    (blob, tree)
}

#[test]
fn fresh_realm_is_current() {
    let (_store, repo) = memory_repo();
    assert_eq!(migrate::detect_version(&repo).unwrap(), CURRENT_VERSION);
    let report = migrate::migrate(&repo).unwrap();
    assert!(report.is_noop());
    assert_eq!(migrate::stored_version(&repo).unwrap(), Some(CURRENT_VERSION));
}

#[test]
fn v1_pointers_upgrade_to_reachability_tree() {
    let (store, repo) = memory_repo();
    let realm = repo.realm().clone();
    let (blob, tree) = seed_objects(&store, &realm);
    for oid in [blob, tree] {
        store
            .update_named_pointer(&realm, &format!("refs/mdgraph/objects/{}", oid.to_hex()), &oid)
            .unwrap();
    }
    assert_eq!(migrate::detect_version(&repo).unwrap(), 1);

    let report = migrate::migrate(&repo).unwrap();
    assert_eq!((report.from, report.to, report.objects), (1, 3, 2));
    assert!(repo.is_protected(&blob).unwrap());
    assert!(repo.is_protected(&tree).unwrap());
    assert!(store
        .list_named_pointers(&realm, "refs/mdgraph/objects/")
        .unwrap()
        .is_empty());
    assert_eq!(store.read_named_pointer(&realm, "refs/mdgraph/object-list").unwrap(), None);

    let again = migrate::migrate(&repo).unwrap();
    assert!(again.is_noop());
}

#[test]
fn v2_list_upgrade_skips_missing_objects() {
    let (store, repo) = memory_repo();
    let realm = repo.realm().clone();
    let (blob, tree) = seed_objects(&store, &realm);
    let missing = ObjectId::from_hex("0123456789012345678901234567890123456789").unwrap();
    let list = format!("{}\n{}\n{}\n", blob.to_hex(), tree.to_hex(), missing.to_hex());
    let list_oid = store.write_blob(&realm, list.as_bytes()).unwrap();
    store
        .update_named_pointer(&realm, "refs/mdgraph/object-list", &list_oid)
        .unwrap();

    let report = migrate::migrate(&repo).unwrap();
    assert_eq!((report.from, report.to, report.objects), (2, 3, 2));
    let mut expected = vec![(blob, ObjectKind::Blob), (tree, ObjectKind::Tree)];
    expected.sort_by_key(|(oid, _)| *oid);
    assert_eq!(repo.protected().unwrap(), expected);
    assert!(repo.root(REACHABLE).unwrap().is_some());
}

#[test]
fn newer_format_is_refused() {
    let (store, repo) = memory_repo();
    let realm = repo.realm().clone();
    let v9 = store.write_blob(&realm, b"9\n").unwrap();
    store.update_named_pointer(&realm, FORMAT, &v9).unwrap();
    assert!(matches!(migrate::migrate(&repo), Err(RealmError::UnsupportedFormat(9))));
}

#[test]
fn garbage_version_is_corrupt() {
    let (store, repo) = memory_repo();
    let realm = repo.realm().clone();
    let bad = store.write_blob(&realm, b"three").unwrap();
    store.update_named_pointer(&realm, FORMAT, &bad).unwrap();
    assert!(matches!(migrate::detect_version(&repo), Err(RealmError::Corrupt { .. })));
}
