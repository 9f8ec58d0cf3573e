use mdgraph_hash::ObjectId;
use mdgraph_odb::OdbError;
use mdgraph_tree::TreeError;

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("illegal connector state: {0}")]
    IllegalState(&'static str),

    #[error("no codec registered for type '{0}'")]
    UnknownCodec(String),

    #[error("invalid type tag '{0}'")]
    InvalidTypeTag(String),

    #[error("no realm to read from or write to")]
    MissingDestination,

    #[error("codec '{tag}' expects a {expected} value")]
    TypeMismatch { tag: String, expected: &'static str },

    #[error("entry name '{0}' is reserved")]
    ReservedName(String),

    #[error("entry name {0:?} contains a line break")]
    UnstorableName(String),

    #[error("corrupt mapped object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}
