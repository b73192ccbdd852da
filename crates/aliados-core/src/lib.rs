//! # aliados-core: Pure Card & Redemption Logic for the Aliados Portal
//!
//! Everything in the merchant portal that has a real invariant lives here:
//! the Luhn check, card formatting, the precondition chain, and the state
//! machines behind the redemption, registration and scan views.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Aliados Merchant Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/merchant (view binding)                   │   │
//! │  │    console ──► commands ──► state (forms behind a mutex)        │   │
//! │  └───────────┬─────────────────────────────────────┬───────────────┘   │
//! │              │ intents                             │ calls              │
//! │  ┌───────────▼───────────────────────┐  ┌──────────▼───────────────┐   │
//! │  │   ★ aliados-core (THIS CRATE) ★   │  │ aliados-gateway          │   │
//! │  │                                   │  │   HTTP, config, session  │   │
//! │  │  card        Luhn + formatting    │  ├──────────────────────────┤   │
//! │  │  validation  precondition chain   │  │ aliados-scan             │   │
//! │  │  redemption  form state machine   │  │   cameras, QR decoding   │   │
//! │  │  registration                     │  └──────────────────────────┘   │
//! │  │  scan        scan session         │                                 │
//! │  │                                   │                                 │
//! │  │  NO I/O • NO NETWORK • NO CAMERA  │                                 │
//! │  └───────────────────────────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`card`] - Luhn validator, normalizer/formatter, [`CardNumber`]
//! - [`types`] - Domain types (OfferSummary, RedemptionAttempt, CardRegistration, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Precondition chain run before any gateway call
//! - [`notice`] - Notices, busy-lock phase, call outcomes
//! - [`redemption`] - Redemption form state machine
//! - [`registration`] - Card registration form state machine
//! - [`scan`] - Scan session state machine and still-image verdicts
//!
//! ## Example Usage
//!
//! ```rust
//! use aliados_core::redemption::{RedemptionForm, SubmitIntent};
//! use aliados_core::types::{BusinessId, OfferId, OfferSummary};
//!
//! let mut form = RedemptionForm::new();
//! form.offers_loaded(vec![OfferSummary { id: OfferId(7), title: "2x1".into() }]);
//! form.select_offer(Some(OfferId(7))).unwrap();
//! form.set_card_input("4111 1111 1111 1111");
//!
//! match form.submit(Some(BusinessId(42))) {
//!     SubmitIntent::Redeem(attempt) => assert_eq!(attempt.card.as_str(), "4111111111111111"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! // A second press while the first call is in flight does nothing.
//! assert_eq!(form.submit(Some(BusinessId(42))), SubmitIntent::Ignored);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod card;
pub mod error;
pub mod notice;
pub mod redemption;
pub mod registration;
pub mod scan;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use card::CardNumber;
pub use error::{CoreError, CoreResult, ValidationError};
pub use notice::{Notice, NoticeKind, Outcome};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Digits in a card number.
pub const CARD_DIGITS: usize = 16;

/// Digits per display group (`4111-1111-1111-1111`).
pub const CARD_GROUP_SIZE: usize = 4;

/// Separator between display groups.
pub const CARD_DELIMITER: char = '-';
