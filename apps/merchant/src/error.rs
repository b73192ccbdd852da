//! # API Error Type
//!
//! Unified error type for merchant commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Merchant Portal                    │
//! │                                                                         │
//! │  Command Function: Result<T, ApiError>                                  │
//! │         │                                                               │
//! │         ├── CoreError::Authentication ─────── AUTHENTICATION_ERROR      │
//! │         ├── ValidationError ────────────────── VALIDATION_ERROR         │
//! │         ├── CameraAccessError ──────────────── CAMERA_ERROR             │
//! │         ├── DecodeError ────────────────────── DECODE_ERROR             │
//! │         ├── GatewayError (config) ──────────── CONFIG_ERROR             │
//! │         └── GatewayError (other) ───────────── GATEWAY_ERROR            │
//! │                                                                         │
//! │  Every variant ends up as a notice on screen. Nothing is retried.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use aliados_core::{CoreError, ValidationError};
use aliados_gateway::GatewayError;
use aliados_scan::{CameraAccessError, DecodeError, ScanError};
use serde::Serialize;
use thiserror::Error;

/// Error returned from merchant commands.
///
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "The card number is not valid. Please check it."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing business context; needs a new sign-in
    AuthenticationError,

    /// Input validation failed; the merchant can fix it
    ValidationError,

    /// Camera unavailable, denied, or insecure context
    CameraError,

    /// Nothing decodable in an uploaded image
    DecodeError,

    /// Gateway call failed (network, status, rejection)
    GatewayError,

    /// Configuration could not be loaded or saved
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication => {
                ApiError::new(ErrorCode::AuthenticationError, err.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<CameraAccessError> for ApiError {
    fn from(err: CameraAccessError) -> Self {
        ApiError::new(ErrorCode::CameraError, err.to_string())
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::new(ErrorCode::DecodeError, err.to_string())
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Camera(e) => e.into(),
            ScanError::Decode(e) => e.into(),
        }
    }
}

/// Converts gateway errors, keeping the server's message when it sent one.
impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        if err.is_config_error() {
            return ApiError::new(ErrorCode::ConfigError, err.to_string());
        }
        match err.status_message() {
            Some(message) => ApiError::new(ErrorCode::GatewayError, message),
            None => {
                tracing::warn!(error = %err, "Gateway call failed");
                ApiError::new(ErrorCode::GatewayError, err.to_string())
            }
        }
    }
}
