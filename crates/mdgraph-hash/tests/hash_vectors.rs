use mdgraph_hash::hasher::Hasher;
use mdgraph_hash::{HashAlgorithm, ObjectId};
use proptest::prelude::*;

// Values below match `git hash-object --stdin` and `git mktree` output.

#[test]
fn empty_blob() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"").unwrap();
    assert_eq!(oid.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
}

#[test]
fn hello_world_blob() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"hello world").unwrap();
    assert_eq!(oid.to_hex(), "95d09f2b10159347eece71399a7e2e907ea3df4f");
}

#[test]
fn empty_tree() {
    let oid = Hasher::hash_object(HashAlgorithm::Sha1, "tree", b"").unwrap();
    assert_eq!(oid.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
}

#[test]
fn raw_digests() {
    assert_eq!(
        Hasher::digest(HashAlgorithm::Sha1, b"").unwrap().to_hex(),
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
    assert_eq!(
        Hasher::digest(HashAlgorithm::Sha256, b"").unwrap().to_hex(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn write_impl_matches_update() {
    use std::io::Write;
    let mut h = Hasher::new(HashAlgorithm::Sha1);
    h.write_all(b"blob 11\0hello world").unwrap();
    assert_eq!(
        h.finalize().unwrap(),
        Hasher::hash_object(HashAlgorithm::Sha1, "blob", b"hello world").unwrap()
    );
}

proptest! {
    #[test]
    fn framing_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let a = Hasher::hash_object(HashAlgorithm::Sha1, "blob", &data).unwrap();
        let b = Hasher::hash_object(HashAlgorithm::Sha1, "blob", &data).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn kind_is_part_of_identity(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let blob = Hasher::hash_object(HashAlgorithm::Sha1, "blob", &data).unwrap();
        let tree = Hasher::hash_object(HashAlgorithm::Sha1, "tree", &data).unwrap();
        prop_assert_ne!(blob, tree);
    }

    #[test]
    fn hex_roundtrip(bytes in proptest::array::uniform20(any::<u8>())) {
        let oid = ObjectId::from_bytes(&bytes, HashAlgorithm::Sha1).unwrap();
        prop_assert_eq!(ObjectId::from_hex(&oid.to_hex()).unwrap(), oid);
    }
}
