//! Error types for nettrie.

use thiserror::Error;

/// Error type for nettrie operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Address text could not be converted
    #[error("unable to convert presentation address '{0}'")]
    InvalidAddress(String),

    /// Prefix length is not a decimal within the address width
    #[error("invalid prefix length: {0}")]
    InvalidPrefixLength(String),

    /// Unknown address family (IP version)
    #[error("invalid address family: {0}")]
    InvalidFamily(u8),

    /// Raw address bytes of the wrong size
    #[error("invalid raw address length: expected {expected}, got {actual}")]
    InvalidRawLength { expected: usize, actual: usize },

    /// Address is not an IPv4-mapped IPv6 address
    #[error("can't map non-mapped IPv6 address back to IPv4: {0}")]
    NotMappedV4(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for nettrie operations.
pub type Result<T> = std::result::Result<T, Error>;
