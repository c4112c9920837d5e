//! Error types for the watch-extract crate.
//!
//! Both variants describe configuration mistakes: retrying the same
//! extraction against fresh content reproduces them every time.

/// Errors that can occur while deriving a value from fetched content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The command name is not one of the supported extraction commands.
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),

    /// The query (CSS selector or JSON path) cannot be interpreted.
    #[error("malformed query: {0}")]
    MalformedQuery(String),
}

/// Convenience type alias for watch-extract results.
pub type Result<T> = std::result::Result<T, ExtractError>;
