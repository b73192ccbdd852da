//! # Error Types
//!
//! Domain-specific error types for aliados-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  aliados-core errors (this file)                                       │
//! │  ├── CoreError        - Broken preconditions (auth + validation)       │
//! │  └── ValidationError  - Locally detected, user-correctable input       │
//! │                                                                         │
//! │  aliados-scan errors (separate crate)                                  │
//! │  ├── CameraAccessError - Permission / insecure context                 │
//! │  └── DecodeError       - Nothing readable in a frame or image          │
//! │                                                                         │
//! │  aliados-gateway errors (separate crate)                               │
//! │  └── GatewayError     - Network, non-2xx, rejected payloads            │
//! │                                                                         │
//! │  Merchant app errors                                                   │
//! │  └── ApiError         - What the view renders                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → notice on screen       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Messages are the exact text shown to the merchant
//! 3. A `CoreError` never reaches the network: it is produced before any call

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Precondition failures detected before a gateway call.
///
/// Authentication is kept apart from validation: a missing business context
/// is not something the merchant can fix by editing the form, they have to
/// sign in again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No business/session identifier is available.
    ///
    /// ## When This Occurs
    /// - The session store has no business id (never signed in, or cleared)
    /// - The stored id is not a valid business id
    #[error("Authentication error: could not identify the business.")]
    Authentication,

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true if the merchant can fix this by editing the form.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    /// Short machine-friendly tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Authentication => "authentication",
            CoreError::Validation(e) => e.kind(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// ## Check Order
/// ```text
/// offer selected? ──► card present? ──► 16 digits? ──► Luhn ok?
///       │                  │                │              │
///       ▼                  ▼                ▼              ▼
/// NoOfferSelected     MissingCard      WrongLength    InvalidChecksum
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The offer selector is still on its default option.
    #[error("Select an offer first.")]
    NoOfferSelected,

    /// The card field is empty.
    #[error("Scan or enter the customer's card first.")]
    MissingCard,

    /// The card field does not hold exactly 16 digits.
    #[error("The card number must have {expected} digits (got {actual}).")]
    WrongLength { expected: usize, actual: usize },

    /// 16 digits, but the Luhn checksum fails.
    #[error("The card number is not valid. Please check it.")]
    InvalidChecksum,

    /// An identifier could not be parsed (e.g., offer id from a selector).
    #[error("{field} has invalid format: {value}")]
    InvalidId { field: String, value: String },
}

impl ValidationError {
    /// Short machine-friendly tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::NoOfferSelected => "no_offer_selected",
            ValidationError::MissingCard => "missing_card",
            ValidationError::WrongLength { .. } => "wrong_length",
            ValidationError::InvalidChecksum => "invalid_checksum",
            ValidationError::InvalidId { .. } => "invalid_id",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::WrongLength {
            expected: 16,
            actual: 8,
        };
        assert_eq!(
            err.to_string(),
            "The card number must have 16 digits (got 8)."
        );
        assert_eq!(
            ValidationError::NoOfferSelected.to_string(),
            "Select an offer first."
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::InvalidChecksum.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_user_correctable());
        // Display passes the inner message through untouched.
        assert_eq!(
            core_err.to_string(),
            ValidationError::InvalidChecksum.to_string()
        );
    }

    #[test]
    fn test_authentication_is_not_user_correctable() {
        assert!(!CoreError::Authentication.is_user_correctable());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ValidationError::MissingCard.kind(), "missing_card");
        assert_eq!(ValidationError::InvalidChecksum.kind(), "invalid_checksum");
        assert_eq!(CoreError::Authentication.kind(), "authentication");
        assert_eq!(
            CoreError::from(ValidationError::NoOfferSelected).kind(),
            "no_offer_selected"
        );
    }
}
