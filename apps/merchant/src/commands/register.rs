//! # Registration Commands
//!
//! Card registration shares the redemption's card checks and busy-lock but
//! needs no offer and no business id.

use aliados_core::registration::RegisterIntent;
use aliados_core::Outcome;
use aliados_gateway::Gateway;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::SubmitOutcome;
use crate::state::RegisterState;

/// Validates the field and issues exactly one `registerCard` call.
pub async fn submit_registration(gateway: &dyn Gateway, register: &RegisterState) -> SubmitOutcome {
    let (attempt_id, registration) = match register.with_form_mut(|form| form.submit(Utc::now())) {
        RegisterIntent::Ignored => {
            debug!("Registration already in flight, ignoring submit");
            return SubmitOutcome::Ignored;
        }
        RegisterIntent::Rejected(err) => {
            debug!(reason = err.kind(), "Registration rejected before sending");
            return SubmitOutcome::Rejected(err.into());
        }
        RegisterIntent::Register {
            attempt_id,
            registration,
        } => (attempt_id, registration),
    };

    let outcome = match gateway.register_card(&registration).await {
        Ok(receipt) => {
            info!(
                card = %registration.card.masked(),
                method = %registration.method,
                "Card registered"
            );
            Outcome::success(receipt.message)
        }
        Err(err) => {
            warn!(card = %registration.card.masked(), error = %err, "Registration failed");
            Outcome::failure(err.status_message())
        }
    };

    register.with_form_mut(|form| {
        if !form.resolve(attempt_id, outcome) {
            warn!(attempt = %attempt_id, "Registration settled for a stale attempt");
        }
        form.notice()
            .cloned()
            .map(SubmitOutcome::Settled)
            .unwrap_or(SubmitOutcome::Ignored)
    })
}

/// Cancel button: clears the field and the notice (ignored while busy).
pub fn clear_registration(register: &RegisterState) {
    register.with_form_mut(|form| form.clear());
}
