use std::collections::BTreeMap;

use mdgraph_hash::ObjectId;
use mdgraph_object::FileMode;
use mdgraph_odb::Realm;

use crate::{BytesValue, Mapper, MapperError, PathTreeCodec, TreeValue};

/// Converts values of one type tag to and from stored objects.
pub trait ValueCodec<V>: Send + Sync {
    /// Tag recorded in every [`Reference`](crate::Reference) this codec writes.
    fn type_tag(&self) -> &str;

    /// Mode used when a value of this codec is an entry of a parent tree.
    fn entry_mode(&self) -> FileMode {
        FileMode::Regular
    }

    /// Persist `value` into `realm`. Nested connectors are saved too, which
    /// is why the value is borrowed mutably.
    fn encode(&self, value: &mut V, mapper: &Mapper<V>, realm: &Realm) -> Result<ObjectId, MapperError>;

    fn decode(&self, oid: &ObjectId, mapper: &Mapper<V>, realm: &Realm) -> Result<V, MapperError>;

    /// Structural copy sharing nothing with `value`.
    fn copy_value(&self, value: &mut V, mapper: &Mapper<V>) -> Result<V, MapperError>;
}

/// Codecs available to a [`Mapper`], keyed by type tag.
pub struct CodecRegistry<V> {
    codecs: BTreeMap<String, Box<dyn ValueCodec<V>>>,
}

impl<V> Default for CodecRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CodecRegistry<V> {
    pub fn new() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Add `codec`, replacing any codec with the same tag.
    pub fn register(&mut self, codec: impl ValueCodec<V> + 'static) -> Result<(), MapperError> {
        let tag = codec.type_tag().to_string();
        validate_tag(&tag)?;
        self.codecs.insert(tag, Box::new(codec));
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&dyn ValueCodec<V>> {
        self.codecs.get(tag).map(|codec| codec.as_ref())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}

impl<V: BytesValue + TreeValue + 'static> CodecRegistry<V> {
    /// Registry with [`BytesCodec`] and [`PathTreeCodec`] under their
    /// default tags.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.codecs.insert(
            BytesCodec::DEFAULT_TAG.to_string(),
            Box::new(BytesCodec::default()),
        );
        registry.codecs.insert(
            PathTreeCodec::DEFAULT_TAG.to_string(),
            Box::new(PathTreeCodec::default()),
        );
        registry
    }
}

/// Tags are stored one per line next to tree entries.
pub(crate) fn validate_tag(tag: &str) -> Result<(), MapperError> {
    if tag.is_empty() || tag.contains(['\t', '\n']) {
        return Err(MapperError::InvalidTypeTag(tag.to_string()));
    }
    Ok(())
}

/// Persists a value as a single blob.
#[derive(Debug, Clone)]
pub struct BytesCodec {
    tag: String,
}

impl BytesCodec {
    pub const DEFAULT_TAG: &'static str = "bytes";

    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    fn bytes<'v, V: BytesValue>(&self, value: &'v V) -> Result<&'v [u8], MapperError> {
        value.as_bytes().ok_or_else(|| MapperError::TypeMismatch {
            tag: self.tag.clone(),
            expected: "byte",
        })
    }
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::with_tag(Self::DEFAULT_TAG)
    }
}

impl<V: BytesValue> ValueCodec<V> for BytesCodec {
    fn type_tag(&self) -> &str {
        &self.tag
    }

    fn encode(&self, value: &mut V, mapper: &Mapper<V>, realm: &Realm) -> Result<ObjectId, MapperError> {
        Ok(mapper.store().write_blob(realm, self.bytes(value)?)?)
    }

    fn decode(&self, oid: &ObjectId, mapper: &Mapper<V>, realm: &Realm) -> Result<V, MapperError> {
        Ok(V::from_bytes(mapper.store().read_blob(realm, oid)?))
    }

    fn copy_value(&self, value: &mut V, _mapper: &Mapper<V>) -> Result<V, MapperError> {
        Ok(V::from_bytes(self.bytes(value)?.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn standard_registry_tags() {
        let registry = CodecRegistry::<Value>::standard();
        assert_eq!(registry.tags().collect::<Vec<_>>(), ["bytes", "tree"]);
        assert!(registry.get("tree").is_some());
        assert!(registry.get("blob").is_none());
    }

    #[test]
    fn register_validates_tag() {
        let mut registry = CodecRegistry::<Vec<u8>>::new();
        registry.register(BytesCodec::with_tag("raw")).unwrap();
        assert!(matches!(
            registry.register(BytesCodec::with_tag("bad\ttag")),
            Err(MapperError::InvalidTypeTag(_))
        ));
        assert!(matches!(
            registry.register(BytesCodec::with_tag("")),
            Err(MapperError::InvalidTypeTag(_))
        ));
        assert_eq!(registry.tags().collect::<Vec<_>>(), ["raw"]);
    }
}
