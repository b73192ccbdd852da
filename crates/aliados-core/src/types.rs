//! # Domain Types
//!
//! Core domain types used throughout the merchant portal.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ MerchantSession │   │  OfferSummary   │   │ RedemptionAttempt   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  business_id?   │   │  id, title      │   │  offer_id           │   │
//! │  └─────────────────┘   │  (selector row) │   │  business_id        │   │
//! │                        └─────────────────┘   │  card (validated)   │   │
//! │                                              └─────────────────────┘   │
//! │                                              ┌─────────────────────┐   │
//! │                                              │ CardRegistration    │   │
//! │                                              │  ─────────────────  │   │
//! │                                              │  card, method, at   │   │
//! │                                              └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! The gateway speaks the portal's original field names (`id_oferta`,
//! `id_negocio`, `titulo`, `cardNumber`). Rust names stay English; serde
//! attributes do the translation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::card::CardNumber;
use crate::error::ValidationError;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of an allied business (the merchant's tenant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessId(pub i64);

/// Identifier of an offer/promotion. Opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferId(pub i64);

macro_rules! numeric_id {
    ($ty:ident, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map($ty)
                    .map_err(|_| ValidationError::InvalidId {
                        field: $field.to_string(),
                        value: s.to_string(),
                    })
            }
        }
    };
}

numeric_id!(BusinessId, "business id");
numeric_id!(OfferId, "offer id");

// =============================================================================
// Merchant Session
// =============================================================================

/// The signed-in merchant context.
///
/// Built once by whoever reads the session store and handed to the flows
/// that need it. The core treats the business id as an opaque required input
/// and fails closed when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantSession {
    pub business_id: Option<BusinessId>,
}

impl MerchantSession {
    /// A session for a known business.
    pub fn for_business(business_id: BusinessId) -> Self {
        MerchantSession {
            business_id: Some(business_id),
        }
    }

    /// A session with no business context (every redemption fails closed).
    pub fn anonymous() -> Self {
        MerchantSession::default()
    }

    /// Builds a session from the raw stored value. Blank or unparsable
    /// values count as absent.
    pub fn from_stored(raw: Option<&str>) -> Self {
        let business_id = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<BusinessId>().ok());
        MerchantSession { business_id }
    }

    /// Returns true if a business id is present.
    pub fn is_authenticated(&self) -> bool {
        self.business_id.is_some()
    }
}

// =============================================================================
// Offers
// =============================================================================

/// One row of the offer selector: `listActiveOffers` returns these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferSummary {
    #[serde(rename = "id_oferta")]
    pub id: OfferId,

    #[serde(rename = "titulo")]
    pub title: String,
}

// =============================================================================
// Redemption
// =============================================================================

/// A fully validated redemption request, ready for the gateway.
///
/// Ephemeral: built per submit, never retried automatically. The attempt id
/// only correlates log lines; it is not part of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RedemptionAttempt {
    #[serde(skip)]
    #[ts(skip)]
    pub attempt_id: Uuid,

    #[serde(rename = "id_oferta")]
    pub offer_id: OfferId,

    #[serde(rename = "id_negocio")]
    pub business_id: BusinessId,

    #[serde(rename = "cardNumber")]
    #[ts(type = "string")]
    pub card: CardNumber,
}

impl RedemptionAttempt {
    pub fn new(business_id: BusinessId, offer_id: OfferId, card: CardNumber) -> Self {
        RedemptionAttempt {
            attempt_id: Uuid::new_v4(),
            offer_id,
            business_id,
            card,
        }
    }
}

/// Success body of `redeemOffer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RedemptionReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Registration
// =============================================================================

/// How a card number reached the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMethod {
    /// Typed into the card field.
    Manual,
    /// Read from a QR code.
    Qr,
}

impl fmt::Display for RegistrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationMethod::Manual => write!(f, "manual"),
            RegistrationMethod::Qr => write!(f, "qr"),
        }
    }
}

/// A validated `registerCard` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CardRegistration {
    #[serde(rename = "cardNumber")]
    #[ts(type = "string")]
    pub card: CardNumber,

    pub method: RegistrationMethod,

    /// When the merchant submitted (ISO-8601 on the wire).
    #[ts(as = "String")]
    pub at: DateTime<Utc>,
}

/// Body of a `registerCard` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationReceipt {
    #[serde(default = "default_ok")]
    pub ok: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

fn default_ok() -> bool {
    true
}

impl Default for RegistrationReceipt {
    /// What an empty 2xx body means.
    fn default() -> Self {
        RegistrationReceipt {
            ok: true,
            message: Some("Registered.".to_string()),
            error: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parsing() {
        assert_eq!("42".parse::<BusinessId>().unwrap(), BusinessId(42));
        assert_eq!(" 7 ".parse::<OfferId>().unwrap(), OfferId(7));
        assert!("abc".parse::<OfferId>().is_err());
        assert!("".parse::<BusinessId>().is_err());
    }

    #[test]
    fn test_session_from_stored_fails_closed() {
        assert!(MerchantSession::from_stored(Some("42")).is_authenticated());
        assert!(!MerchantSession::from_stored(None).is_authenticated());
        assert!(!MerchantSession::from_stored(Some("  ")).is_authenticated());
        assert!(!MerchantSession::from_stored(Some("not-a-number")).is_authenticated());
    }

    #[test]
    fn test_offer_summary_wire_names() {
        let rows: Vec<OfferSummary> =
            serde_json::from_str(r#"[{"id_oferta": 3, "titulo": "Free dessert"}]"#).unwrap();
        assert_eq!(rows[0].id, OfferId(3));
        assert_eq!(rows[0].title, "Free dessert");
    }

    #[test]
    fn test_redemption_attempt_payload() {
        let card = CardNumber::parse("4111-1111-1111-1111").unwrap();
        let attempt = RedemptionAttempt::new(BusinessId(42), OfferId(7), card);
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id_oferta": 7,
                "id_negocio": 42,
                "cardNumber": "4111111111111111",
            })
        );
    }

    #[test]
    fn test_registration_payload() {
        let at = DateTime::parse_from_rfc3339("2026-10-17T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let reg = CardRegistration {
            card: CardNumber::parse("4111111111111111").unwrap(),
            method: RegistrationMethod::Qr,
            at,
        };
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["cardNumber"], "4111111111111111");
        assert_eq!(json["method"], "qr");
        assert_eq!(json["at"], "2026-10-17T12:00:00Z");
    }

    #[test]
    fn test_registration_receipt_defaults() {
        let receipt: RegistrationReceipt = serde_json::from_str("{}").unwrap();
        assert!(receipt.ok);
        assert_eq!(receipt.message, None);

        let rejected: RegistrationReceipt =
            serde_json::from_str(r#"{"ok": false, "message": "Already registered"}"#).unwrap();
        assert!(!rejected.ok);
    }
}
