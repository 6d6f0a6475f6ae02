use std::time::Duration;

use thiserror::Error;

use crate::endpoint::Endpoint;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("endpoint host must not be empty")]
    EmptyHost,
    #[error("endpoint port 0 is not a valid tcp port")]
    ZeroPort,
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Why a single connect attempt did not produce a connection. Never fatal, it
/// only drives the retry loop.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("connect to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: Endpoint, timeout: Duration },
    #[error("connect to {endpoint} failed: {source}")]
    Io {
        endpoint: Endpoint,
        #[source]
        source: std::io::Error,
    },
    #[error("handshake with {endpoint} failed: {reason}")]
    Handshake { endpoint: Endpoint, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("connector {0} is already running")]
    AlreadyStarted(String),
    #[error("connector {0} is closed")]
    Closed(String),
    #[error("duplicate connector name {0}")]
    DuplicateName(String),
    #[error("connector {name} has invalid reconnect settings: {reason}")]
    InvalidSettings { name: String, reason: String },
}
