//! Path-addressed hierarchical tree.
//!
//! A [`PathTree`] maps slash-delimited paths to values. Every node may hold
//! a value, children, or both (a *mount point*); intermediate nodes are
//! created on first insertion along a path and are never removed.

mod error;
mod iter;
mod node;
mod path;

pub use error::TreeError;
pub use iter::Enumerate;
pub use node::TreeNode;
pub use path::{canonicalize_path, segments};

/// Tree of [`TreeNode`]s addressed by canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree<V> {
    root: TreeNode<V>,
}

impl<V> Default for PathTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PathTree<V> {
    pub fn new() -> Self {
        Self {
            root: TreeNode::new(),
        }
    }

    pub fn root(&self) -> &TreeNode<V> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TreeNode<V> {
        &mut self.root
    }

    pub fn into_root(self) -> TreeNode<V> {
        self.root
    }

    /// Graft `node` at `path`.
    ///
    /// Missing intermediate nodes are created. An intermediate node holding
    /// a value fails with [`TreeError::ConflictingPathType`] unless
    /// `allow_leaf_conversion` is set, in which case it keeps its value and
    /// gains children. A target that already holds a value or children fails
    /// with [`TreeError::PathAlreadyExists`]. On error the tree is unchanged.
    pub fn insert(
        &mut self,
        path: &str,
        node: TreeNode<V>,
        allow_leaf_conversion: bool,
    ) -> Result<&mut TreeNode<V>, TreeError> {
        let segs = segments(path)?;
        self.check_insert(&segs, allow_leaf_conversion)?;

        let Some((last, parents)) = segs.split_last() else {
            self.root = node;
            return Ok(&mut self.root);
        };
        let mut cur = &mut self.root;
        for seg in parents {
            cur = cur.children.entry((*seg).to_string()).or_default();
        }
        let slot = cur.children.entry((*last).to_string()).or_default();
        *slot = node;
        Ok(slot)
    }

    /// Insert a leaf holding `value`.
    pub fn insert_value(
        &mut self,
        path: &str,
        value: V,
        allow_leaf_conversion: bool,
    ) -> Result<&mut TreeNode<V>, TreeError> {
        self.insert(path, TreeNode::leaf(value), allow_leaf_conversion)
    }

    fn check_insert(&self, segs: &[&str], allow_leaf_conversion: bool) -> Result<(), TreeError> {
        let mut cur = &self.root;
        for (depth, seg) in segs.iter().enumerate() {
            if depth > 0 && cur.value.is_some() && !allow_leaf_conversion {
                return Err(TreeError::ConflictingPathType {
                    path: segs[..depth].join("/"),
                });
            }
            match cur.children.get(*seg) {
                Some(child) => cur = child,
                None => return Ok(()),
            }
        }
        if cur.is_occupied() {
            return Err(TreeError::PathAlreadyExists { path: segs.join("/") });
        }
        Ok(())
    }

    /// Node at `path`, if any. Invalid paths have no node.
    pub fn lookup(&self, path: &str) -> Option<&TreeNode<V>> {
        let segs = segments(path).ok()?;
        segs.iter().try_fold(&self.root, |node, seg| node.children.get(*seg))
    }

    pub fn lookup_mut(&mut self, path: &str) -> Option<&mut TreeNode<V>> {
        let segs = segments(path).ok()?;
        segs.iter()
            .try_fold(&mut self.root, |node, seg| node.children.get_mut(*seg))
    }

    /// Value stored at `path`.
    pub fn get(&self, path: &str) -> Option<&V> {
        self.lookup(path)?.value.as_ref()
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut V> {
        self.lookup_mut(path)?.value.as_mut()
    }

    /// Whether a node, valued or intermediate, exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Number of nodes holding a value.
    pub fn len(&self) -> usize {
        self.enumerate(false).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.root.is_occupied()
    }

    /// Child segment names of the node at `path`, in order.
    pub fn child_names(&self, path: &str) -> Option<Vec<&str>> {
        Some(self.lookup(path)?.children.keys().map(String::as_str).collect())
    }

    /// Paths of all valued nodes, depth first.
    pub fn paths(&self) -> Vec<String> {
        self.enumerate(false).map(|(path, _)| path).collect()
    }

    /// Depth-first `(path, node)` pairs, children in segment order.
    ///
    /// Valued nodes are always yielded. Nodes without a value are yielded
    /// only when `include_intermediate` is set; the root is never yielded
    /// as an intermediate. Each call starts a fresh traversal.
    pub fn enumerate(&self, include_intermediate: bool) -> Enumerate<'_, V> {
        Enumerate::new(&self.root, include_intermediate)
    }
}

impl<V> From<TreeNode<V>> for PathTree<V> {
    fn from(root: TreeNode<V>) -> Self {
        Self { root }
    }
}
