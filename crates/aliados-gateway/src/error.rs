//! # Gateway Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Response            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Http{status, message}  │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Rejected(message)      │ │
//! │  │  ConfigLoad/Save│  │  ClientBuild    │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │    Session      │   Nothing here is retried automatically. Every    │
//! │  │                 │   retry is the merchant pressing submit again.    │
//! │  │  SessionStore   │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Could not build HTTP client: {0}")]
    ClientBuild(String),

    // =========================================================================
    // Response Errors
    // =========================================================================
    /// Non-2xx response. `message` is the body's `error`/`message` field.
    #[error("{}", .message.clone().unwrap_or_else(|| format!("HTTP error {}", .status)))]
    Http { status: u16, message: Option<String> },

    /// 2xx response whose body says `ok: false`.
    #[error("{}", .0.clone().unwrap_or_else(|| "Request rejected".to_string()))]
    Rejected(Option<String>),

    /// 2xx response whose body is not what the operation expects.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Session store error: {0}")]
    SessionStore(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for GatewayError {
    fn from(err: toml::ser::Error) -> Self {
        GatewayError::ConfigSaveFailed(err.to_string())
    }
}

impl GatewayError {
    /// Maps a reqwest failure, keeping timeouts distinct.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(timeout_secs)
        } else if err.is_builder() {
            GatewayError::InvalidUrl(err.to_string())
        } else {
            GatewayError::ConnectionFailed(err.to_string())
        }
    }

    /// Text the gateway sent for the merchant, verbatim.
    ///
    /// `None` for a bare non-2xx status and for transport failures, so the
    /// caller shows its own fallback.
    pub fn user_message(&self) -> Option<String> {
        match self {
            GatewayError::Http { message, .. } => message.clone(),
            GatewayError::Rejected(message) => message.clone(),
            _ => None,
        }
    }

    /// Like [`user_message`](Self::user_message), but a bare non-2xx status
    /// becomes `HTTP error <status>`.
    pub fn status_message(&self) -> Option<String> {
        match self {
            GatewayError::Http { .. } => Some(self.to_string()),
            _ => self.user_message(),
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidConfig(_)
                | GatewayError::InvalidUrl(_)
                | GatewayError::ConfigLoadFailed(_)
                | GatewayError::ConfigSaveFailed(_)
        )
    }
}
