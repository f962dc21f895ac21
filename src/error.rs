use std::path::PathBuf;

use crate::Hash;

/// error type for cube operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a cube repository (run `cube init` first): {0}")]
    NotInitialized(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(Hash),

    #[error("corrupt object: {0}")]
    CorruptObject(Hash),

    #[error("corrupt index at {path}: {message}")]
    CorruptIndex { path: PathBuf, message: String },

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("branch already exists: {0}")]
    BranchAlreadyExists(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("HEAD is not a symbolic branch reference: {0:?}")]
    DetachedHead(String),

    #[error("nothing to commit (index is empty)")]
    EmptyCommit,

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("path is outside the workspace: {0}")]
    PathOutsideWorkspace(PathBuf),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("invalid ignore pattern {pattern:?}: {message}")]
    InvalidIgnorePattern { pattern: String, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cbor serialization error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

/// convert a walkdir error into an io error carrying the walked path
pub(crate) fn walk_error(root: &std::path::Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| root.to_path_buf());
    Error::Io {
        path,
        source: err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walkdir error")),
    }
}
