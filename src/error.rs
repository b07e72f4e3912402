//! Unified error type.

use thiserror::Error;

/// The error type returned by sutbench's fallible infrastructure operations.
///
/// Application-level failures (404, 415, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// failures that stop a process: binding a port, accepting a connection,
/// talking to a target as a client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("http: {0}")]
    Http(#[from] hyper::Error),

    #[error("request: {0}")]
    Request(#[from] http::Error),

    #[error("invalid url `{0}`")]
    InvalidUrl(String),
}
