//! Persisting a [`PathTree`] of connectors as nested trees.
//!
//! Each node becomes one tree object. A valued child is stored through its
//! own connector and appears as a plain entry; a child with children is a
//! subtree, and a mount point keeps its own value under [`VALUE_ENTRY`]
//! inside that subtree. Every tree with valued entries also carries a
//! [`TYPES_ENTRY`] blob of `"<tag>\t<name>\n"` lines so the entries decode
//! back into unmapped connectors of the right type.

use std::collections::BTreeMap;

use bstr::{BStr, ByteSlice};
use mdgraph_hash::ObjectId;
use mdgraph_object::{FileMode, Tree, TreeEntry};
use mdgraph_odb::Realm;
use mdgraph_tree::{PathTree, TreeNode};

use crate::codec::validate_tag;
use crate::{Connector, Mapper, MapperError, TreeValue, ValueCodec};

pub const TYPES_ENTRY: &str = ".mdgraph-types";
pub const VALUE_ENTRY: &str = ".mdgraph-value";

/// Persists a [`PathTree`] of connectors; leaves load lazily.
#[derive(Debug, Clone)]
pub struct PathTreeCodec {
    tag: String,
}

impl PathTreeCodec {
    pub const DEFAULT_TAG: &'static str = "tree";

    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for PathTreeCodec {
    fn default() -> Self {
        Self::with_tag(Self::DEFAULT_TAG)
    }
}

impl<V: TreeValue> ValueCodec<V> for PathTreeCodec {
    fn type_tag(&self) -> &str {
        &self.tag
    }

    fn entry_mode(&self) -> FileMode {
        FileMode::Tree
    }

    fn encode(&self, value: &mut V, mapper: &Mapper<V>, realm: &Realm) -> Result<ObjectId, MapperError> {
        let tree = value.as_tree_mut().ok_or_else(|| self.mismatch())?;
        encode_node(tree.root_mut(), mapper, realm)
    }

    fn decode(&self, oid: &ObjectId, mapper: &Mapper<V>, realm: &Realm) -> Result<V, MapperError> {
        Ok(V::from_tree(PathTree::from(decode_node(oid, mapper, realm)?)))
    }

    fn copy_value(&self, value: &mut V, mapper: &Mapper<V>) -> Result<V, MapperError> {
        let tree = value.as_tree_mut().ok_or_else(|| self.mismatch())?;
        Ok(V::from_tree(PathTree::from(copy_node(tree.root_mut(), mapper)?)))
    }
}

impl PathTreeCodec {
    fn mismatch(&self) -> MapperError {
        MapperError::TypeMismatch {
            tag: self.tag.clone(),
            expected: "tree",
        }
    }
}

fn encode_node<V>(
    node: &mut TreeNode<Connector<V>>,
    mapper: &Mapper<V>,
    realm: &Realm,
) -> Result<ObjectId, MapperError> {
    let mut entries = Vec::new();
    let mut types = String::new();

    if let Some(connector) = node.value_mut() {
        save_entry(VALUE_ENTRY, connector, mapper, realm, &mut entries, &mut types)?;
    }
    for (name, child) in node.children_mut() {
        if name == TYPES_ENTRY || name == VALUE_ENTRY {
            return Err(MapperError::ReservedName(name.clone()));
        }
        // The type list is line-oriented.
        if name.contains(|c: char| c == '\n' || c == '\r') {
            return Err(MapperError::UnstorableName(name.clone()));
        }
        if child.is_leaf() {
            if let Some(connector) = child.value_mut() {
                save_entry(name, connector, mapper, realm, &mut entries, &mut types)?;
                continue;
            }
        }
        let oid = encode_node(child, mapper, realm)?;
        entries.push(TreeEntry::directory(name.as_str(), oid));
    }

    if !types.is_empty() {
        let oid = mapper.store().write_blob(realm, types.as_bytes())?;
        entries.push(TreeEntry::file(TYPES_ENTRY, oid));
    }
    Ok(mapper.store().write_tree(realm, &Tree::from_entries(entries))?)
}

fn save_entry<V>(
    name: &str,
    connector: &mut Connector<V>,
    mapper: &Mapper<V>,
    realm: &Realm,
    entries: &mut Vec<TreeEntry>,
    types: &mut String,
) -> Result<(), MapperError> {
    validate_tag(connector.type_tag())?;
    let reference = connector.save_to(mapper, realm, false)?;
    if let Some(oid) = reference.location {
        let mode = mapper.codec(&reference.type_tag)?.entry_mode();
        entries.push(TreeEntry::new(mode, name, oid));
    }
    types.push_str(&reference.type_tag);
    types.push('\t');
    types.push_str(name);
    types.push('\n');
    Ok(())
}

fn decode_node<V>(oid: &ObjectId, mapper: &Mapper<V>, realm: &Realm) -> Result<TreeNode<Connector<V>>, MapperError> {
    let store = mapper.store();
    let tree = store.read_tree(realm, oid)?;
    let types = match tree.find(BStr::new(TYPES_ENTRY)) {
        Some(entry) => parse_types(&entry.oid, &store.read_blob(realm, &entry.oid)?)?,
        None => BTreeMap::new(),
    };

    let mut node = TreeNode::new();
    for (name, tag) in &types {
        let location = tree.find(BStr::new(name)).map(|entry| entry.oid);
        let reference = crate::Reference {
            type_tag: tag.clone(),
            location,
        };
        let connector = Connector::from_reference(reference, Some(realm.clone()));
        if name == VALUE_ENTRY {
            node.set_value(Some(connector));
        } else {
            node.insert_child(name, TreeNode::leaf(connector))?;
        }
    }

    for entry in tree.iter() {
        let name = entry.name.to_str().map_err(|_| MapperError::Corrupt {
            oid: *oid,
            reason: format!("entry name {:?} is not UTF-8", entry.name),
        })?;
        if name == TYPES_ENTRY || types.contains_key(name) {
            continue;
        }
        if !entry.mode.is_tree() {
            return Err(MapperError::Corrupt {
                oid: *oid,
                reason: format!("entry '{name}' has no recorded type"),
            });
        }
        // A subtree named like a valued leaf would have been skipped above.
        let child = decode_node(&entry.oid, mapper, realm)?;
        node.insert_child(name, child)?;
    }
    Ok(node)
}

fn parse_types(oid: &ObjectId, data: &[u8]) -> Result<BTreeMap<String, String>, MapperError> {
    let corrupt = |reason: String| MapperError::Corrupt { oid: *oid, reason };
    let text = std::str::from_utf8(data).map_err(|_| corrupt("type list is not UTF-8".into()))?;
    let mut types = BTreeMap::new();
    for line in text.lines() {
        let (tag, name) = line
            .split_once('\t')
            .ok_or_else(|| corrupt(format!("malformed type line '{line}'")))?;
        types.insert(name.to_string(), tag.to_string());
    }
    Ok(types)
}

fn copy_node<V>(node: &mut TreeNode<Connector<V>>, mapper: &Mapper<V>) -> Result<TreeNode<Connector<V>>, MapperError> {
    let mut copy = TreeNode::new();
    if let Some(connector) = node.value_mut() {
        copy.set_value(Some(connector.deep_copy(mapper)?));
    }
    for (name, child) in node.children_mut() {
        copy.insert_child(name, copy_node(child, mapper)?)?;
    }
    Ok(copy)
}
