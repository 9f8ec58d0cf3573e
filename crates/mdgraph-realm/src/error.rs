use std::path::PathBuf;

use mdgraph_mapper::MapperError;
use mdgraph_merge::MergeError;
use mdgraph_odb::OdbError;

#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error("no realm found at {0}")]
    NotFound(PathBuf),

    #[error("pointer '{0}' has no root yet")]
    NoRoot(String),

    #[error("realm format version {0} is newer than this library supports")]
    UnsupportedFormat(u32),

    #[error("corrupt {what}: {reason}")]
    Corrupt { what: String, reason: String },

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Mapper(#[from] MapperError),
}
