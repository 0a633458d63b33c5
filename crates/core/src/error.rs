//! Crate-wide error enum.
//!
//! Every fallible call in the workspace returns [`Result`]. The binary wraps
//! these in `anyhow` at the edge.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised anywhere in galaxy-trader.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before a run starts: empty or unordered bars, a non-positive
    /// balance, negative fee or slippage.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bad or unreadable settings.
    #[error("config: {0}")]
    Config(String),

    /// A response or file that could not be turned into bars.
    #[error("malformed data: {0}")]
    Data(String),

    /// Raised by a signal provider; aborts the run.
    #[error("signal provider failed: {0}")]
    Signal(String),

    /// Transport failure or non-2xx status from a remote API.
    #[error("request failed: {0}")]
    Http(String),

    /// SQLite bar cache could not be opened, read or written.
    #[error("bar cache: {0}")]
    Cache(String),

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Build an [`Error::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Build an [`Error::Data`].
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Build an [`Error::Signal`].
    pub fn signal(msg: impl Into<String>) -> Self {
        Error::Signal(msg.into())
    }

    /// Build an [`Error::Http`].
    pub fn http(msg: impl Into<String>) -> Self {
        Error::Http(msg.into())
    }

    /// Build an [`Error::Cache`].
    pub fn cache(msg: impl Into<String>) -> Self {
        Error::Cache(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(Error::invalid_input("empty series").to_string(), "invalid input: empty series");
        assert_eq!(Error::cache("locked").to_string(), "bar cache: locked");
    }

    #[test]
    fn test_io_is_transparent() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "missing.toml");
    }
}
