//! Error type shared by the coderank crates

/// Fatal analysis and query errors. Per-file parse problems are not errors;
/// they travel as [`crate::ParseWarning`] values.
#[derive(Debug, thiserror::Error)]
pub enum CodeRankError {
    #[error("repository loader supplied no files")]
    NoFiles,

    /// A call edge references a qualified id missing from the symbol table.
    /// This is a bug in graph construction, not a property of the input.
    #[error("inconsistent call graph: edge {caller} -> {callee} references an unknown symbol")]
    InconsistentGraph { caller: String, callee: String },

    #[error("stale generation: query captured generation {requested}, current is {current}")]
    StaleGeneration { requested: u64, current: u64 },

    #[error("no analysis has been loaded")]
    NotLoaded,

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodeRankError>;
