//! # Redemption Form
//!
//! The redemption view as a pure state machine. It never calls the gateway
//! itself; `submit` returns an intent and the caller reports back with
//! `resolve` once the call settles.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Redemption Submission                             │
//! │                                                                         │
//! │   offers_loaded ──► selector Ready ──► select_offer                    │
//! │                                            │                            │
//! │   type / paste / scan ──► card_input       │                            │
//! │                               │            │                            │
//! │                               ▼            ▼                            │
//! │                       submit(business_id)                               │
//! │                               │                                         │
//! │          ┌────────────────────┼──────────────────────┐                  │
//! │          ▼                    ▼                      ▼                  │
//! │      Ignored             Rejected(err)          Redeem(attempt)         │
//! │   (already busy)      (no network call)     phase = Submitting          │
//! │                                                      │                  │
//! │                                          caller awaits gateway          │
//! │                                                      │                  │
//! │                                        resolve(attempt_id, outcome)     │
//! │                                     ┌────────────────┴───────────┐      │
//! │                                     ▼                            ▼      │
//! │                                Success                       Failure    │
//! │                        clear card + selector          keep inputs,      │
//! │                                                       show message      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::card::{format_card16, reformat_live, CardNumber};
use crate::error::{CoreError, ValidationError, ValidationResult};
use crate::notice::{FormPhase, Notice, Outcome, OFFERS_EMPTY, OFFERS_FAILED, REDEEM_FALLBACK, REDEEM_SUCCESS};
use crate::types::{BusinessId, OfferId, OfferSummary, RedemptionAttempt};
use crate::validation::validate_redemption;

// =============================================================================
// Offer Selector
// =============================================================================

/// Population state of the offer selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OfferList {
    #[default]
    Loading,
    Ready(Vec<OfferSummary>),
    /// Loaded, but the business has no active offers. Selector disabled.
    Empty,
    /// The list could not be fetched. Selector disabled.
    Failed,
}

impl OfferList {
    pub fn offers(&self) -> &[OfferSummary] {
        match self {
            OfferList::Ready(offers) => offers,
            _ => &[],
        }
    }

    pub fn contains(&self, id: OfferId) -> bool {
        self.offers().iter().any(|o| o.id == id)
    }

    /// Placeholder text for the selector's default option.
    pub fn placeholder(&self) -> &'static str {
        match self {
            OfferList::Loading => "Loading offers...",
            OfferList::Ready(_) => "Select an offer",
            OfferList::Empty => OFFERS_EMPTY,
            OfferList::Failed => OFFERS_FAILED,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, OfferList::Ready(_))
    }
}

// =============================================================================
// Intent
// =============================================================================

/// What the caller must do after `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitIntent {
    /// A call is already in flight; nothing happens.
    Ignored,
    /// A precondition failed. The notice is already set.
    Rejected(CoreError),
    /// Issue exactly one `redeemOffer` call with this payload.
    Redeem(RedemptionAttempt),
}

// =============================================================================
// Redemption Form
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RedemptionForm {
    card_input: String,
    selected_offer: Option<OfferId>,
    offers: OfferList,
    phase: FormPhase,
    notice: Option<Notice>,
}

impl RedemptionForm {
    /// A fresh form with the offer list still loading.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn card_input(&self) -> &str {
        &self.card_input
    }

    pub fn selected_offer(&self) -> Option<OfferId> {
        self.selected_offer
    }

    pub fn offers(&self) -> &OfferList {
        &self.offers
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    // -------------------------------------------------------------------------
    // Offer selector
    // -------------------------------------------------------------------------

    pub fn offers_loading(&mut self) {
        self.offers = OfferList::Loading;
    }

    /// Populates the selector. A previous selection survives only if the
    /// offer is still in the list.
    pub fn offers_loaded(&mut self, offers: Vec<OfferSummary>) {
        self.offers = if offers.is_empty() {
            OfferList::Empty
        } else {
            OfferList::Ready(offers)
        };
        if let Some(id) = self.selected_offer {
            if !self.offers.contains(id) {
                self.selected_offer = None;
            }
        }
    }

    pub fn offers_failed(&mut self) {
        self.offers = OfferList::Failed;
        self.selected_offer = None;
        self.notice = Some(Notice::error(OFFERS_FAILED));
    }

    /// Selects an offer, or goes back to the default option with `None`.
    pub fn select_offer(&mut self, offer: Option<OfferId>) -> ValidationResult<()> {
        if let Some(id) = offer {
            if !self.offers.contains(id) {
                return Err(ValidationError::InvalidId {
                    field: "offer id".to_string(),
                    value: id.to_string(),
                });
            }
        }
        self.selected_offer = offer;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Card field (last writer wins)
    // -------------------------------------------------------------------------

    /// Replaces the field with the formatted form of `raw` (paste, decode).
    pub fn set_card_input(&mut self, raw: &str) {
        self.card_input = format_card16(raw);
    }

    /// Keystroke handler: reformats and returns the new cursor position.
    pub fn type_card_input(&mut self, value: &str, cursor: usize) -> usize {
        let (text, cursor) = reformat_live(value, cursor);
        self.card_input = text;
        cursor
    }

    /// Fills the field from a scan hand-off.
    pub fn accept_scan(&mut self, card: &CardNumber) {
        self.card_input = card.display();
    }

    // -------------------------------------------------------------------------
    // Submit / resolve
    // -------------------------------------------------------------------------

    /// Runs the precondition chain and, if it passes, takes the busy-lock.
    pub fn submit(&mut self, business_id: Option<BusinessId>) -> SubmitIntent {
        if self.phase.is_busy() {
            return SubmitIntent::Ignored;
        }

        match validate_redemption(business_id, self.selected_offer, &self.card_input) {
            Ok(attempt) => {
                self.phase = FormPhase::Submitting {
                    attempt_id: attempt.attempt_id,
                };
                self.notice = None;
                SubmitIntent::Redeem(attempt)
            }
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                SubmitIntent::Rejected(err)
            }
        }
    }

    /// Releases the busy-lock for `attempt_id` and applies the outcome.
    ///
    /// Returns false (and changes nothing) if that attempt is not the one in
    /// flight.
    pub fn resolve(&mut self, attempt_id: Uuid, outcome: Outcome) -> bool {
        if !self.phase.owns(attempt_id) {
            return false;
        }
        self.phase = FormPhase::Idle;

        match outcome {
            Outcome::Success { message } => {
                self.card_input.clear();
                self.selected_offer = None;
                self.notice = Some(Notice::success(Outcome::message_or(message, REDEEM_SUCCESS)));
            }
            Outcome::Failure { message } => {
                self.notice = Some(Notice::error(Outcome::message_or(message, REDEEM_FALLBACK)));
            }
        }
        true
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
