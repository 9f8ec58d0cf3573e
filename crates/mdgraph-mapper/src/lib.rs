//! Lazy materialization of values stored in mdgraph realms.
//!
//! A [`Connector`] wraps one value and tracks whether it is loaded and
//! whether it changed since the last save. Values are turned into objects by
//! the [`ValueCodec`] registered for their type tag in the [`Mapper`]'s
//! [`CodecRegistry`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use mdgraph_mapper::{BytesCodec, CodecRegistry, Connector, Mapper, Value};
//! use mdgraph_odb::{MemoryStore, Realm};
//!
//! let mapper = Mapper::new(Arc::new(MemoryStore::new()), CodecRegistry::<Value>::standard())
//!     .with_default_realm(Realm::new("notes"));
//! let mut note = Connector::from_object(BytesCodec::DEFAULT_TAG, Value::Bytes(b"hi".to_vec()));
//! let reference = note.save(&mapper, false)?;
//! assert!(reference.location.is_some());
//! note.purge()?;
//! # Ok::<(), mdgraph_mapper::MapperError>(())
//! ```

mod codec;
mod connector;
mod error;
mod mapper;
mod reference;
mod tree_codec;
mod value;

pub use codec::{BytesCodec, CodecRegistry, ValueCodec};
pub use connector::Connector;
pub use error::MapperError;
pub use mapper::Mapper;
pub use reference::Reference;
pub use tree_codec::{PathTreeCodec, TYPES_ENTRY, VALUE_ENTRY};
pub use value::{BytesValue, TreeValue, Value};
