//! Library error types

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::content::RenderError;

/// Result type alias for blog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a listing, a generation run or a request
#[derive(Error, Debug)]
pub enum Error {
    /// A directory or file could not be read or written
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `_config.yml` exists but is not valid
    #[error("invalid configuration {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    /// A post body could not be rendered
    #[error("failed to render {path}: {source}")]
    Render {
        path: String,
        #[source]
        source: RenderError,
    },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
