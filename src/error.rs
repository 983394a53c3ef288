//! Error types and handling for the bridge
//!
//! Every failure inside one poll cycle is one of these variants. The daemon
//! catches them at the cycle boundary and logs them; none of them terminate
//! the process on their own.

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Both refresh and login failed
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Non-success status from the telemetry or device tree endpoints
    #[error("API error: {message}")]
    Api { message: String },

    /// A field required by a later step was missing from a response
    #[error("Missing field: {field} ({message})")]
    MissingField { field: String, message: String },

    /// A hub command could not be delivered
    #[error("Hub error: {message}")]
    Hub { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },
}

impl BridgeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new missing-field error
    pub fn missing_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::MissingField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new hub error
    pub fn hub<S: Into<String>>(message: S) -> Self {
        Self::Hub {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Whether this error means no bearer credential could be obtained
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Whether this error came from the telemetry API returning unusable data
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::MissingField { .. })
    }

    /// Short failure class used as a structured log field
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } | Self::Validation { .. } => "config",
            Self::Auth { .. } => "auth",
            Self::Api { .. } | Self::MissingField { .. } => "upstream",
            Self::Hub { .. } => "hub",
            Self::Serialization { .. } | Self::Io { .. } => "state",
            Self::Network { .. } | Self::Timeout { .. } => "network",
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for BridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}
