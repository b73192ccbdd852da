//! # Validation Module
//!
//! The precondition chain shared by every flow that calls the gateway.
//!
//! ## Check Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Redemption Preconditions                           │
//! │                                                                         │
//! │  1. business id present?  ──no──► CoreError::Authentication            │
//! │           │ yes                                                         │
//! │  2. offer selected?       ──no──► ValidationError::NoOfferSelected     │
//! │           │ yes                                                         │
//! │  3. card field empty?     ──yes─► ValidationError::MissingCard         │
//! │           │ no                                                          │
//! │  4. exactly 16 digits?    ──no──► ValidationError::WrongLength         │
//! │           │ yes                                                         │
//! │  5. Luhn ok?              ──no──► ValidationError::InvalidChecksum     │
//! │           │ yes                                                         │
//! │           ▼                                                             │
//! │     RedemptionAttempt (the only thing the gateway ever sees)           │
//! │                                                                         │
//! │  Registration runs steps 3-5 only.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here performs I/O. A failed check means no network call is made.

use chrono::{DateTime, Utc};

use crate::card::CardNumber;
use crate::error::{CoreError, CoreResult, ValidationError, ValidationResult};
use crate::types::{BusinessId, CardRegistration, OfferId, RedemptionAttempt, RegistrationMethod};

// =============================================================================
// Redemption
// =============================================================================

/// Runs the full redemption precondition chain.
///
/// ## Example
/// ```rust
/// use aliados_core::types::{BusinessId, OfferId};
/// use aliados_core::validation::validate_redemption;
///
/// let attempt = validate_redemption(
///     Some(BusinessId(42)),
///     Some(OfferId(7)),
///     "4111-1111-1111-1111",
/// ).unwrap();
/// assert_eq!(attempt.card.as_str(), "4111111111111111");
/// ```
pub fn validate_redemption(
    business_id: Option<BusinessId>,
    offer_id: Option<OfferId>,
    raw_card: &str,
) -> CoreResult<RedemptionAttempt> {
    let business_id = business_id.ok_or(CoreError::Authentication)?;
    let offer_id = offer_id.ok_or(ValidationError::NoOfferSelected)?;
    let card = CardNumber::parse(raw_card)?;

    Ok(RedemptionAttempt::new(business_id, offer_id, card))
}

// =============================================================================
// Registration
// =============================================================================

/// Runs the card checks for the registration flow and stamps the payload.
pub fn validate_registration(
    raw_card: &str,
    method: RegistrationMethod,
    at: DateTime<Utc>,
) -> ValidationResult<CardRegistration> {
    let card = CardNumber::parse(raw_card)?;
    Ok(CardRegistration { card, method, at })
}

// =============================================================================
// Selector Input
// =============================================================================

/// Parses the value of the offer selector.
///
/// The selector's default option carries an empty value, which means
/// "nothing selected" rather than an error.
pub fn parse_offer_selection(value: &str) -> ValidationResult<Option<OfferId>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse::<OfferId>().map(Some)
}

// =============================================================================
// Unit Tests
// =============================================================================
