//! Object store interface for mdgraph realms.
//!
//! A realm is one connected graph of content-addressed objects plus a small
//! set of named pointers into it. [`ObjectStore`] is the seam the rest of the
//! workspace talks to; two backends ship here:
//!
//! - [`MemoryStore`]: multi-realm, in-process, with I/O accounting.
//! - [`LooseStore`]: git-compatible on-disk realms (`objects/xx/yyyy…`,
//!   zlib-compressed, pointer files under `refs/`).

pub mod config;
mod error;
pub mod lock;
mod loose;
mod memory;
mod realm;
mod store;

pub use config::OdbConfig;
pub use error::OdbError;
pub use lock::RealmLock;
pub use loose::LooseStore;
pub use memory::{IoEvent, IoStats, MemoryStore};
pub use realm::Realm;
pub use store::{ListedEntry, ObjectStore};
