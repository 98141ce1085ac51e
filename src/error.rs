pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Rejected diagram input. Raised before any layout work runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Input must have a \"{field}\" array")]
    MissingArray { field: &'static str },

    #[error("Node at index {index} must have a non-empty string \"{field}\"")]
    MissingNodeField { index: usize, field: &'static str },

    #[error("Edge at index {index} must have a string \"{field}\"")]
    MissingEdgeField { index: usize, field: &'static str },

    #[error("Invalid value for \"{field}\": {message}")]
    InvalidValue { field: String, message: String },

    #[error("Duplicate node id: \"{id}\"")]
    DuplicateNodeId { id: String },

    #[error("Node \"{id}\" must have a non-empty \"label\"")]
    EmptyLabel { id: String },

    #[error("Node \"{id}\" has an invalid {field} color: \"{value}\"")]
    InvalidColor {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("Edge references unknown node: \"{id}\"")]
    UnknownNode { id: String },
}

/// The compressed payload could not be turned back into a scene.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decompress Excalidraw scene: payload is empty")]
    Empty,

    #[error("Failed to decompress Excalidraw scene: invalid character {ch:?} at offset {offset}")]
    InvalidCharacter { ch: char, offset: usize },

    #[error("Failed to decompress Excalidraw scene: payload is truncated")]
    Truncated,

    #[error("Failed to decompress Excalidraw scene: bad dictionary reference {code}")]
    BadReference { code: usize },

    #[error("Failed to decompress Excalidraw scene: decoded text is not valid UTF-16")]
    InvalidUtf16,

    #[error("Invalid Excalidraw scene JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The document text does not carry a drawing block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Could not find compressed-json block in Excalidraw file")]
    MissingDrawingBlock,

    #[error("Drawing block starting at line {line} is never closed")]
    UnterminatedBlock { line: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    #[error("Path escapes the document root: {path}")]
    InvalidPath { path: String },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Stable machine-readable code, reported by the CLI envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Codec(_) => "CODEC_ERROR",
            Error::Format(_) => "FORMAT_ERROR",
            Error::Storage(StorageError::NotFound { .. }) => "NOT_FOUND",
            Error::Storage(StorageError::InvalidPath { .. } | StorageError::Io { .. }) => {
                "STORAGE_ERROR"
            }
        }
    }
}
