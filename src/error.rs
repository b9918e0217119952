//! Unified error type.

use std::{fmt, io};

/// The error type returned by the server's fallible operations.
///
/// Application-level failures (404, 500, ...) are HTTP responses, and sink
/// failures are plain [`io::Error`]s returned from handlers. This type only
/// surfaces infrastructure failures that stop the server from running.
#[derive(Debug)]
pub enum Error {
    /// The listening socket could not be bound.
    Bind { addr: String, source: io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "bind {addr}: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
        }
    }
}
