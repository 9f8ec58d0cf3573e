use mdgraph_odb::OdbError;
use mdgraph_tree::TreeError;

/// Errors from [`TreeMerger`](crate::TreeMerger).
///
/// Every variant except `Odb` is raised before the new root is published,
/// so the previous root stays valid.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("'{path}' is used both as a leaf and as a directory in one batch")]
    ConflictingNameUse { path: String },

    #[error("'{path}' appears more than once in the batch")]
    DuplicateLeaf { path: String },

    #[error("cannot place a directory at '{path}': a file is already there")]
    DirectoryOverFileConflict { path: String },

    #[error("cannot place a file at '{path}': a directory is already there")]
    FileOverDirectoryConflict { path: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}
