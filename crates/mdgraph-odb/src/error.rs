use std::path::PathBuf;

use mdgraph_hash::{HashError, ObjectId};
use mdgraph_object::{ObjectError, ObjectKind};

/// Errors raised by object store backends.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object {oid} not found in realm {realm}")]
    NotFound { realm: String, oid: ObjectId },

    #[error("object {oid} is a {actual}, expected a {expected}")]
    UnexpectedKind {
        oid: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("corrupt object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error("invalid pointer name: '{0}'")]
    InvalidPointerName(String),

    #[error("remote realm '{0}' cannot be reached without a transport")]
    UnsupportedRemote(String),

    #[error("remote realm '{0}' is read-only")]
    ReadOnlyRemote(String),

    #[error("realm '{realm}' is locked by another writer")]
    Locked { realm: String },

    #[error("{0} lock poisoned by a panicking thread")]
    Poisoned(&'static str),

    #[error("unable to create lock file '{path}': {source}")]
    LockCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Hash(#[from] HashError),
}
