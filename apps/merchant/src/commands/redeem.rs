//! # Redemption Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Redemption Lifecycle                                 │
//! │                                                                         │
//! │  load_offers ──► selector: Loading → Ready | Empty | Failed             │
//! │                                                                         │
//! │  select_offer / type_card / scan hand-off                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  submit_redemption                                                      │
//! │    form.submit(business) ─┬─ Ignored   (already in flight)              │
//! │                           ├─ Rejected  (no network call)                │
//! │                           └─ Redeem ──► gateway.redeem_offer            │
//! │                                              │                          │
//! │                              form.resolve ◄──┘  success: reset fields   │
//! │                                                 failure: keep, retry    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use aliados_core::redemption::SubmitIntent;
use aliados_core::validation::parse_offer_selection;
use aliados_core::{CoreError, Notice, Outcome};
use aliados_gateway::Gateway;
use tracing::{debug, info, warn};

use super::SubmitOutcome;
use crate::error::ApiError;
use crate::state::{RedeemState, SessionState};

/// Fetches the business's active offers into the selector.
///
/// Returns the number of offers. Without a business id the selector is
/// disabled and nothing is fetched.
pub async fn load_offers(
    gateway: &dyn Gateway,
    session: &SessionState,
    redeem: &RedeemState,
) -> Result<usize, ApiError> {
    let Some(business_id) = session.business_id().await else {
        redeem.with_form_mut(|form| {
            form.offers_failed();
            form.set_notice(Notice::error(CoreError::Authentication.to_string()));
        });
        return Err(CoreError::Authentication.into());
    };

    redeem.with_form_mut(|form| form.offers_loading());

    match gateway.list_active_offers(business_id).await {
        Ok(offers) => {
            let count = offers.len();
            debug!(business = %business_id, count, "Offer selector populated");
            redeem.with_form_mut(|form| form.offers_loaded(offers));
            Ok(count)
        }
        Err(err) => {
            warn!(business = %business_id, error = %err, "Could not load offers");
            redeem.with_form_mut(|form| form.offers_failed());
            Err(err.into())
        }
    }
}

/// Selects an offer by its selector value. An empty value goes back to the
/// default option.
pub fn select_offer(redeem: &RedeemState, value: &str) -> Result<(), ApiError> {
    let offer = parse_offer_selection(value)?;
    redeem.with_form_mut(|form| form.select_offer(offer))?;
    Ok(())
}

/// Runs the precondition chain and, if it passes, issues exactly one
/// `redeemOffer` call.
///
/// A trigger that arrives while a call is in flight is ignored. The call is
/// never cancelled or retried; the form stays busy until it settles.
pub async fn submit_redemption(
    gateway: &dyn Gateway,
    session: &SessionState,
    redeem: &RedeemState,
) -> SubmitOutcome {
    let business_id = session.business_id().await;

    let attempt = match redeem.with_form_mut(|form| form.submit(business_id)) {
        SubmitIntent::Ignored => {
            debug!("Redemption already in flight, ignoring submit");
            return SubmitOutcome::Ignored;
        }
        SubmitIntent::Rejected(err) => {
            if err.is_user_correctable() {
                debug!(reason = err.kind(), "Redemption rejected before sending");
            } else {
                warn!(reason = err.kind(), "Redemption blocked, no business in session");
            }
            return SubmitOutcome::Rejected(err.into());
        }
        SubmitIntent::Redeem(attempt) => attempt,
    };

    let outcome = match gateway.redeem_offer(&attempt).await {
        Ok(receipt) => {
            info!(
                attempt = %attempt.attempt_id,
                offer = %attempt.offer_id,
                card = %attempt.card.masked(),
                "Offer redeemed"
            );
            Outcome::success(receipt.message)
        }
        Err(err) => {
            warn!(
                attempt = %attempt.attempt_id,
                offer = %attempt.offer_id,
                error = %err,
                "Redemption failed"
            );
            Outcome::failure(err.user_message())
        }
    };

    redeem.with_form_mut(|form| {
        if !form.resolve(attempt.attempt_id, outcome) {
            warn!(attempt = %attempt.attempt_id, "Redemption settled for a stale attempt");
        }
        form.notice()
            .cloned()
            .map(SubmitOutcome::Settled)
            .unwrap_or(SubmitOutcome::Ignored)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
