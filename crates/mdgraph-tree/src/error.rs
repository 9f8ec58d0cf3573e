/// Errors from path-tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("'{path}' holds a value and cannot be used as a directory")]
    ConflictingPathType { path: String },

    #[error("'{path}' already exists")]
    PathAlreadyExists { path: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
}
