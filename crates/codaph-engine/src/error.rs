use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub enum Error {
    Mirror(String),
    Remote(String),
    Timeout(String),
    Unsupported(String),
    CircuitOpen,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mirror(msg) => write!(f, "mirror error: {msg}"),
            Error::Remote(msg) => write!(f, "remote memory error: {msg}"),
            Error::Timeout(msg) => write!(f, "remote call timed out: {msg}"),
            Error::Unsupported(msg) => write!(f, "unsupported operation: {msg}"),
            Error::CircuitOpen => write!(f, "remote circuit is open; write skipped"),
        }
    }
}

impl std::error::Error for Error {}

impl From<codaph_mirror::Error> for Error {
    fn from(err: codaph_mirror::Error) -> Self {
        Error::Mirror(err.to_string())
    }
}
