use mdgraph_tree::PathTree;

use crate::Connector;

/// Values that [`BytesCodec`](crate::BytesCodec) can persist as one blob.
pub trait BytesValue: Sized {
    fn from_bytes(bytes: Vec<u8>) -> Self;

    /// The bytes, or `None` if this value is not a byte value.
    fn as_bytes(&self) -> Option<&[u8]>;
}

/// Values that [`PathTreeCodec`](crate::PathTreeCodec) can persist as
/// nested trees.
pub trait TreeValue: Sized {
    fn from_tree(tree: PathTree<Connector<Self>>) -> Self;

    fn as_tree_mut(&mut self) -> Option<&mut PathTree<Connector<Self>>>;
}

impl BytesValue for Vec<u8> {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        bytes
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

/// General-purpose mapped value: raw bytes, or a tree of further mapped
/// values each loaded on demand.
#[derive(Debug)]
pub enum Value {
    Bytes(Vec<u8>),
    Tree(Box<PathTree<Connector<Value>>>),
}

impl Value {
    pub fn tree(&self) -> Option<&PathTree<Connector<Value>>> {
        match self {
            Value::Tree(tree) => Some(tree.as_ref()),
            Value::Bytes(_) => None,
        }
    }
}

impl BytesValue for Value {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes.as_slice()),
            Value::Tree(_) => None,
        }
    }
}

impl TreeValue for Value {
    fn from_tree(tree: PathTree<Connector<Self>>) -> Self {
        Value::Tree(Box::new(tree))
    }

    fn as_tree_mut(&mut self) -> Option<&mut PathTree<Connector<Self>>> {
        match self {
            Value::Tree(tree) => Some(tree.as_mut()),
            Value::Bytes(_) => None,
        }
    }
}
