//! Error types for the smart bin monitor
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Main error type for the crate
#[derive(Debug, Snafu)]
pub enum Error {
    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// IO error (file operations, etc.)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },

    /// Document store access failed (network, auth, quota, timeout)
    #[snafu(display("Store error during {operation}: {message}"))]
    Store { operation: String, message: String },

    /// A required field was left empty
    #[snafu(display("{field} is required"))]
    EmptyField { field: &'static str },

    /// Another registry record already uses this hardware address
    #[snafu(display("Hardware address {address} is already registered to bin {assigned_id}"))]
    DuplicateHardwareAddress { address: String, assigned_id: String },

    /// Marker drag attempted outside edit mode
    #[snafu(display("Bin positions can only be changed in edit mode"))]
    EditModeDisabled,

    /// Another pan or drag gesture is already active
    #[snafu(display("Another map gesture is already in progress"))]
    GestureInProgress,

    /// No marker exists for the bin
    #[snafu(display("Unknown bin: {bin_id}"))]
    UnknownBin { bin_id: String },
}

impl Error {
    /// Build a store error for the named operation
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the document store rather than from validation
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::Store { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;
