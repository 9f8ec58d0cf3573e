use std::cmp::Ordering;

use mdgraph_hash::{HashAlgorithm, ObjectId};
use mdgraph_object::{FileMode, Tree, TreeEntry};

fn file(name: &str) -> TreeEntry {
    TreeEntry::file(name, ObjectId::NULL_SHA1)
}

fn dir(name: &str) -> TreeEntry {
    TreeEntry::directory(name, ObjectId::NULL_SHA1)
}

#[test]
fn hyphenated_name_sorts_before_directory_prefix() {
    assert_eq!(TreeEntry::canonical_cmp(&file("foo-bar"), &dir("foo")), Ordering::Less);
    assert_eq!(TreeEntry::canonical_cmp(&dir("foo-bar"), &dir("foo")), Ordering::Less);
}

#[test]
fn file_prefix_sorts_before_hyphenated_name() {
    assert_eq!(TreeEntry::canonical_cmp(&file("foo"), &file("foo-bar")), Ordering::Less);
}

#[test]
fn directory_sorts_before_digit_suffix() {
    assert_eq!(TreeEntry::canonical_cmp(&dir("foo"), &file("foo0")), Ordering::Less);
}

#[test]
fn file_before_directory_of_same_name() {
    assert_eq!(TreeEntry::canonical_cmp(&file("abc"), &dir("abc")), Ordering::Less);
}

#[test]
fn encoded_order_matches_git() {
    // `git mktree` orders these as: foo-bar, foo.c, foo (tree), foo0
    let tree = Tree::from_entries([file("foo0"), dir("foo"), file("foo.c"), file("foo-bar")]);
    let names: Vec<_> = tree.iter().map(|e| e.name.to_string()).collect();
    assert_eq!(names, ["foo-bar", "foo.c", "foo", "foo0"]);
}

#[test]
fn known_tree_hash() {
    // printf 'hello world' | git hash-object -w --stdin
    // printf '100644 blob 95d09f…\thello.txt\n' | git mktree
    let blob = ObjectId::from_hex("95d09f2b10159347eece71399a7e2e907ea3df4f").unwrap();
    let tree = Tree::from_entries([TreeEntry::new(FileMode::Regular, "hello.txt", blob)]);
    let oid = mdgraph_object::Object::Tree(tree)
        .compute_oid(HashAlgorithm::Sha1)
        .unwrap();
    assert_eq!(oid.to_hex(), "e8c3bcec01ac3c2ea41249cdfc8c4493d9c29836");
}
