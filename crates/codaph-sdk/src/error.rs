use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Error type for SDK-level operations.
#[derive(Debug)]
pub enum Error {
    /// A session or project referenced by id was never mirrored.
    NotFound(String),
    /// Invalid input parameters (bad project root, empty session id, etc.).
    InvalidInput(String),
    /// Error surfaced from the runtime orchestration layer.
    Runtime(codaph_runtime::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

impl From<codaph_runtime::Error> for Error {
    fn from(err: codaph_runtime::Error) -> Self {
        Error::Runtime(err)
    }
}
