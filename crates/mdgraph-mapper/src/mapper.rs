use std::sync::Arc;

use mdgraph_odb::{ObjectStore, Realm};

use crate::{CodecRegistry, MapperError, ValueCodec};

/// Everything a [`Connector`](crate::Connector) needs to load and save:
/// the store, the codecs, and the realm used when a connector has none.
pub struct Mapper<V> {
    store: Arc<dyn ObjectStore>,
    registry: CodecRegistry<V>,
    default_realm: Option<Realm>,
}

impl<V> Mapper<V> {
    pub fn new(store: Arc<dyn ObjectStore>, registry: CodecRegistry<V>) -> Self {
        Self {
            store,
            registry,
            default_realm: None,
        }
    }

    pub fn with_default_realm(mut self, realm: Realm) -> Self {
        self.default_realm = Some(realm);
        self
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn shared_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub fn registry(&self) -> &CodecRegistry<V> {
        &self.registry
    }

    pub fn default_realm(&self) -> Option<&Realm> {
        self.default_realm.as_ref()
    }

    pub fn codec(&self, tag: &str) -> Result<&dyn ValueCodec<V>, MapperError> {
        self.registry
            .get(tag)
            .ok_or_else(|| MapperError::UnknownCodec(tag.to_string()))
    }
}
