//! Unified error type.

use std::fmt;
use std::net::AddrParseError;

/// The error type returned by stint's fallible operations.
///
/// Application-level errors (404, 422, etc.) are HTTP
/// [`Response`](crate::Response) values, and handler panics are never caught.
/// This type only surfaces server start-up failures.
#[derive(Debug)]
pub enum Error {
    /// The address given to [`Server::bind`](crate::Server::bind) is not `host:port`.
    Addr(AddrParseError),
    /// The listener could not be bound.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addr(e) => write!(f, "invalid bind address: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Addr(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<AddrParseError> for Error {
    fn from(e: AddrParseError) -> Self {
        Self::Addr(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
