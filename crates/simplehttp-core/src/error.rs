//! Error types for simplehttp-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the simplehttp server
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Lifecycle misuse
    #[error("Invalid server state: {0}")]
    State(#[from] StateError),

    /// IO error while binding or serving
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Fatal: the server never starts listening.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The parallel route lists differ in length
    #[error("Route lists differ in length: {paths} paths, {kinds} kinds, {payloads} payloads")]
    ShapeMismatch {
        paths: usize,
        kinds: usize,
        payloads: usize,
    },

    /// A required value is absent or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Port is not an integer or lies outside 1025..=65535
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Route path does not start with '/'
    #[error("Invalid route path: {0:?}")]
    InvalidPath(String),

    /// Route path configured more than once
    #[error("Duplicate route path: {0}")]
    DuplicatePath(String),

    /// Settings file could not be read
    #[error("Can't read file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings document is not well-formed
    #[error("Invalid settings document: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// Lifecycle errors: calling an operation in a state that does not allow it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// `start` before a successful `initialize`
    #[error("Server is not initialized")]
    NotInitialized,

    /// `stop` while the server is not running
    #[error("Server is not running")]
    NotRunning,

    /// `initialize` while the server is running
    #[error("Server is already running")]
    AlreadyRunning,
}

impl Error {
    /// Returns the configuration error, if this is one
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Error::Config(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the lifecycle error, if this is one
    pub fn as_state(&self) -> Option<&StateError> {
        match self {
            Error::State(err) => Some(err),
            _ => None,
        }
    }
}
