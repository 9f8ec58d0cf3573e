use std::collections::BTreeSet;

use mdgraph_tree::{PathTree, TreeError};
use proptest::prelude::*;

fn path_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-c]{1,2}", 1..4)
}

proptest! {
    #[test]
    fn enumeration_matches_inserted_set(paths in prop::collection::vec(path_strategy(), 0..32)) {
        let mut tree = PathTree::new();
        let mut expected = BTreeSet::new();
        for segs in &paths {
            let path = segs.join("/");
            match tree.insert_value(&path, path.clone(), true) {
                Ok(_) => {
                    expected.insert(segs.clone());
                }
                Err(TreeError::PathAlreadyExists { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // Depth-first with ordered children is lexicographic order on segments.
        let want: Vec<String> = expected.iter().map(|s| s.join("/")).collect();
        prop_assert_eq!(tree.paths(), want.clone());
        prop_assert_eq!(tree.len(), want.len());
        for path in &want {
            prop_assert_eq!(tree.get(path), Some(path));
        }
    }

    #[test]
    fn intermediates_are_prefixes(paths in prop::collection::vec(path_strategy(), 1..16)) {
        let mut tree = PathTree::new();
        for segs in &paths {
            let _ = tree.insert_value(&segs.join("/"), (), true);
        }
        let all: Vec<String> = tree.enumerate(true).map(|(p, _)| p).collect();
        let mut sorted = all.clone();
        sorted.sort_by(|a, b| a.split('/').cmp(b.split('/')));
        sorted.dedup();
        prop_assert_eq!(&all, &sorted);
        for path in &all {
            if let Some((parent, _)) = path.rsplit_once('/') {
                prop_assert!(all.iter().any(|p| p == parent));
            }
        }
    }
}
