use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Mirror(codaph_mirror::Error),
    Engine(codaph_engine::Error),
    Provider(codaph_providers::Error),
    Io(std::io::Error),
    LockTimeout(String),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Mirror(err) => write!(f, "mirror error: {err}"),
            Error::Engine(err) => write!(f, "ingest error: {err}"),
            Error::Provider(err) => write!(f, "provider error: {err}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::LockTimeout(msg) => write!(f, "sync lock timeout: {msg}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Mirror(err) => Some(err),
            Error::Engine(err) => Some(err),
            Error::Provider(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::LockTimeout(_) | Error::Config(_) => None,
        }
    }
}

impl From<codaph_mirror::Error> for Error {
    fn from(err: codaph_mirror::Error) -> Self {
        Error::Mirror(err)
    }
}

impl From<codaph_engine::Error> for Error {
    fn from(err: codaph_engine::Error) -> Self {
        Error::Engine(err)
    }
}

impl From<codaph_providers::Error> for Error {
    fn from(err: codaph_providers::Error) -> Self {
        Error::Provider(err)
    }
}

impl From<codaph_core::Error> for Error {
    fn from(err: codaph_core::Error) -> Self {
        Error::Io(std::io::Error::other(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
