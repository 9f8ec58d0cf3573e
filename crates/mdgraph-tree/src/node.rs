use std::collections::{btree_map, BTreeMap};

use crate::TreeError;

/// A node of a [`PathTree`](crate::PathTree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<V> {
    pub(crate) value: Option<V>,
    pub(crate) children: BTreeMap<String, TreeNode<V>>,
}

impl<V> Default for TreeNode<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TreeNode<V> {
    /// Empty intermediate node.
    pub fn new() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }

    pub fn leaf(value: V) -> Self {
        Self {
            value: Some(value),
            children: BTreeMap::new(),
        }
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.value.as_mut()
    }

    /// Replace the value, returning the previous one.
    pub fn set_value(&mut self, value: Option<V>) -> Option<V> {
        std::mem::replace(&mut self.value, value)
    }

    pub fn children(&self) -> &BTreeMap<String, TreeNode<V>> {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode<V>> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut TreeNode<V>> {
        self.children.get_mut(name)
    }

    pub fn children_mut(&mut self) -> btree_map::IterMut<'_, String, TreeNode<V>> {
        self.children.iter_mut()
    }

    /// Attach `child` under the single segment `name`, returning the node
    /// it replaced.
    pub fn insert_child(&mut self, name: &str, child: TreeNode<V>) -> Result<Option<TreeNode<V>>, TreeError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            return Err(TreeError::InvalidPath {
                path: name.to_string(),
                reason: "not a single path segment",
            });
        }
        Ok(self.children.insert(name.to_string(), child))
    }

    /// Holds a value and children.
    pub fn is_mount_point(&self) -> bool {
        self.value.is_some() && !self.children.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.value.is_some() || !self.children.is_empty()
    }

    pub fn into_parts(self) -> (Option<V>, BTreeMap<String, TreeNode<V>>) {
        (self.value, self.children)
    }
}
