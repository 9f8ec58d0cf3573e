use std::collections::btree_map;

use crate::TreeNode;

/// Lazy depth-first walk returned by [`PathTree::enumerate`](crate::PathTree::enumerate).
///
/// Cloning captures the current position, so a traversal can be forked and
/// resumed independently.
pub struct Enumerate<'a, V> {
    root: Option<&'a TreeNode<V>>,
    stack: Vec<(String, btree_map::Iter<'a, String, TreeNode<V>>)>,
    include_intermediate: bool,
}

impl<'a, V> Enumerate<'a, V> {
    pub(crate) fn new(root: &'a TreeNode<V>, include_intermediate: bool) -> Self {
        Self {
            root: Some(root),
            stack: Vec::new(),
            include_intermediate,
        }
    }
}

impl<V> Clone for Enumerate<'_, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            stack: self.stack.clone(),
            include_intermediate: self.include_intermediate,
        }
    }
}

impl<'a, V> Iterator for Enumerate<'a, V> {
    type Item = (String, &'a TreeNode<V>);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            self.stack.push((String::new(), root.children.iter()));
            if root.value.is_some() {
                return Some((String::new(), root));
            }
        }
        loop {
            let (prefix, children) = self.stack.last_mut()?;
            let Some((name, node)) = children.next() else {
                self.stack.pop();
                continue;
            };
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            self.stack.push((path.clone(), node.children.iter()));
            if node.value.is_some() || self.include_intermediate {
                return Some((path, node));
            }
        }
    }
}
