//! # Notices and Outcomes
//!
//! The small vocabulary the form state machines share: what the view shows
//! under a form (a [`Notice`]), how a form tracks an in-flight call
//! ([`FormPhase`]), and how a settled gateway call is reported back
//! ([`Outcome`]).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// =============================================================================
// Default Messages
// =============================================================================

pub const REDEEM_SUCCESS: &str = "Offer redeemed successfully!";
pub const REDEEM_FALLBACK: &str = "Could not complete the redemption.";
pub const REGISTER_SUCCESS: &str = "Card registered successfully.";
pub const REGISTER_FALLBACK: &str = "Could not register the card. Try again.";
pub const OFFERS_EMPTY: &str = "No active offers.";
pub const OFFERS_FAILED: &str = "Could not load offers.";
pub const IMAGE_VALID: &str = "Valid code. Ready to submit.";
pub const IMAGE_INVALID_CARD: &str = "The QR does not contain a valid card number.";
pub const IMAGE_UNREADABLE: &str = "Could not read the QR code from the image.";

// =============================================================================
// Notice
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A message rendered under a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

// =============================================================================
// Form Phase
// =============================================================================

/// Busy-lock of a submit control.
///
/// ```text
///   Idle ──submit (valid)──► Submitting{attempt_id} ──resolve(attempt_id)──► Idle
///    ▲                              │
///    └──── submit while busy ───────┘  (ignored, no second call)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Submitting { attempt_id: Uuid },
}

impl FormPhase {
    pub fn is_busy(&self) -> bool {
        matches!(self, FormPhase::Submitting { .. })
    }

    /// True if `attempt_id` is the call currently in flight.
    pub fn owns(&self, attempt_id: Uuid) -> bool {
        matches!(self, FormPhase::Submitting { attempt_id: id } if *id == attempt_id)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// How a gateway call settled, as seen by a form.
///
/// `message` is the text from the response body when there was one; the
/// form substitutes its default otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { message: Option<String> },
    Failure { message: Option<String> },
}

impl Outcome {
    pub fn success(message: Option<String>) -> Self {
        Outcome::Success { message }
    }

    pub fn failure(message: Option<String>) -> Self {
        Outcome::Failure { message }
    }

    /// Picks the body message when present and non-blank, `fallback` otherwise.
    pub(crate) fn message_or(message: Option<String>, fallback: &str) -> String {
        message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
