use mdgraph_object::{Commit, Signature, Tree, TreeEntry};
use mdgraph_odb::{LooseStore, ObjectStore, OdbConfig, OdbError, Realm};

fn stores() -> (tempfile::TempDir, tempfile::TempDir, LooseStore) {
    let upstream = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let store = LooseStore::new(OdbConfig {
        remote_cache: Some(cache.path().to_path_buf()),
        ..OdbConfig::default()
    });
    (upstream, cache, store)
}

#[test]
fn commit_closure_is_fetched_into_cache() {
    let (upstream, _cache, store) = stores();
    let origin = Realm::local(upstream.path());
    store.init(&origin).unwrap();

    let readme = store.write_blob(&origin, b"# notes\n").unwrap();
    let inner = store
        .write_tree(&origin, &Tree::from_entries(vec![TreeEntry::file("readme.md", readme)]))
        .unwrap();
    let root = store
        .write_tree(&origin, &Tree::from_entries(vec![TreeEntry::directory("docs", inner)]))
        .unwrap();
    let author = Signature::new("Ada", "ada@example.com", 1_700_000_000, 60);
    let commit = store
        .write_commit(&origin, &Commit::new(root, author, "snapshot\n"))
        .unwrap();

    let remote = Realm::new(format!("file://{}", upstream.path().display()));
    assert!(remote.is_remote());
    let cache = store.remote_cache(&remote).unwrap();
    assert!(!store.contains_object(&cache, &commit).unwrap());

    let read = store.read_commit(&remote, &commit).unwrap();
    assert_eq!(read.tree, root);
    for oid in [commit, root, inner, readme] {
        assert!(store.contains_object(&cache, &oid).unwrap(), "{oid} not cached");
    }

    let listed = store.read_tree_recursive(&remote, &root).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].path, "docs/readme.md");
    assert_eq!(listed[0].oid, readme);
}

#[test]
fn remote_realm_rejects_writes() {
    let (upstream, _cache, store) = stores();
    let remote = Realm::new(format!("remote:{}", upstream.path().display()));
    assert!(matches!(store.write_blob(&remote, b"x"), Err(OdbError::ReadOnlyRemote(_))));
    assert!(matches!(store.lock_realm(&remote), Err(OdbError::ReadOnlyRemote(_))));
}

#[test]
fn unreachable_remote_is_unsupported() {
    let (_upstream, _cache, store) = stores();
    let remote = Realm::new("ssh://example.invalid/realm");
    let oid = mdgraph_hash::ObjectId::from_hex("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").unwrap();
    assert!(matches!(store.read_object(&remote, &oid), Err(OdbError::UnsupportedRemote(_))));
}
