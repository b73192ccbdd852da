//! # Registration Form
//!
//! Sibling of [`crate::redemption`]: same card checks, same busy-lock, but
//! the payload goes to `registerCard` and there is no offer or business
//! precondition. A form is built for one entry method: the manual page
//! always sends `manual`, the QR page always sends `qr`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::card::{format_card16, reformat_live, CardNumber};
use crate::error::ValidationError;
use crate::notice::{FormPhase, Notice, Outcome, REGISTER_FALLBACK, REGISTER_SUCCESS};
use crate::types::{CardRegistration, RegistrationMethod};
use crate::validation::validate_registration;

/// What the caller must do after `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterIntent {
    Ignored,
    Rejected(ValidationError),
    /// Issue exactly one `registerCard` call. `attempt_id` goes back into
    /// `resolve`.
    Register {
        attempt_id: Uuid,
        registration: CardRegistration,
    },
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    method: RegistrationMethod,
    card_input: String,
    phase: FormPhase,
    notice: Option<Notice>,
}

impl RegistrationForm {
    pub fn new(method: RegistrationMethod) -> Self {
        RegistrationForm {
            method,
            card_input: String::new(),
            phase: FormPhase::Idle,
            notice: None,
        }
    }

    pub fn method(&self) -> RegistrationMethod {
        self.method
    }

    pub fn card_input(&self) -> &str {
        &self.card_input
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn set_card_input(&mut self, raw: &str) {
        self.card_input = format_card16(raw);
    }

    pub fn type_card_input(&mut self, value: &str, cursor: usize) -> usize {
        let (text, cursor) = reformat_live(value, cursor);
        self.card_input = text;
        cursor
    }

    pub fn accept_scan(&mut self, card: &CardNumber) {
        self.card_input = card.display();
    }

    /// Cancel button: empties the field and hides the notice.
    ///
    /// Does nothing while a call is in flight; that call still settles
    /// through `resolve`.
    pub fn clear(&mut self) {
        if self.phase.is_busy() {
            return;
        }
        self.card_input.clear();
        self.notice = None;
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Validates the field and takes the busy-lock. `at` is the submission
    /// timestamp that ends up in the payload.
    pub fn submit(&mut self, at: DateTime<Utc>) -> RegisterIntent {
        if self.phase.is_busy() {
            return RegisterIntent::Ignored;
        }

        match validate_registration(&self.card_input, self.method, at) {
            Ok(registration) => {
                let attempt_id = Uuid::new_v4();
                self.phase = FormPhase::Submitting { attempt_id };
                self.notice = None;
                RegisterIntent::Register {
                    attempt_id,
                    registration,
                }
            }
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                RegisterIntent::Rejected(err)
            }
        }
    }

    /// Releases the busy-lock. Success clears the field; failure keeps it for
    /// a retry.
    pub fn resolve(&mut self, attempt_id: Uuid, outcome: Outcome) -> bool {
        if !self.phase.owns(attempt_id) {
            return false;
        }
        self.phase = FormPhase::Idle;

        match outcome {
            Outcome::Success { message } => {
                self.card_input.clear();
                self.notice = Some(Notice::success(Outcome::message_or(message, REGISTER_SUCCESS)));
            }
            Outcome::Failure { message } => {
                self.notice = Some(Notice::error(Outcome::message_or(message, REGISTER_FALLBACK)));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;

    fn register(intent: RegisterIntent) -> (Uuid, CardRegistration) {
        match intent {
            RegisterIntent::Register {
                attempt_id,
                registration,
            } => (attempt_id, registration),
            other => panic!("expected Register, got {:?}", other),
        }
    }

    #[test]
    fn test_manual_registration_round() {
        let mut form = RegistrationForm::new(RegistrationMethod::Manual);
        form.set_card_input("4111 1111 1111 1111");

        let (id, reg) = register(form.submit(Utc::now()));
        assert_eq!(reg.method, RegistrationMethod::Manual);
        assert_eq!(reg.card.as_str(), "4111111111111111");
        assert_eq!(form.submit(Utc::now()), RegisterIntent::Ignored);

        form.resolve(id, Outcome::success(Some("Registered.".into())));
        assert_eq!(form.card_input(), "");
        assert_eq!(form.notice().unwrap().kind, NoticeKind::Success);
        assert_eq!(form.notice().unwrap().message, "Registered.");
    }

    #[test]
    fn test_qr_form_sends_qr_method() {
        let mut form = RegistrationForm::new(RegistrationMethod::Qr);
        form.accept_scan(&CardNumber::parse("4111111111111111").unwrap());
        let (_, reg) = register(form.submit(Utc::now()));
        assert_eq!(reg.method, RegistrationMethod::Qr);
    }

    #[test]
    fn test_invalid_card_never_locks() {
        let mut form = RegistrationForm::new(RegistrationMethod::Manual);
        form.set_card_input("1234567812345678");
        assert_eq!(
            form.submit(Utc::now()),
            RegisterIntent::Rejected(ValidationError::InvalidChecksum)
        );
        assert!(!form.is_busy());
    }

    #[test]
    fn test_failure_uses_fallback_and_keeps_field() {
        let mut form = RegistrationForm::new(RegistrationMethod::Manual);
        form.set_card_input("4111111111111111");
        let (id, _) = register(form.submit(Utc::now()));
        form.resolve(id, Outcome::failure(None));
        assert_eq!(form.notice().unwrap().message, REGISTER_FALLBACK);
        assert_eq!(form.card_input(), "4111-1111-1111-1111");
    }

    #[test]
    fn test_clear() {
        let mut form = RegistrationForm::new(RegistrationMethod::Manual);
        form.set_card_input("4111");
        form.submit(Utc::now());
        assert!(form.notice().is_some());

        form.clear();
        assert_eq!(form.card_input(), "");
        assert!(form.notice().is_none());
    }

    #[test]
    fn test_clear_while_busy_is_a_no_op() {
        let mut form = RegistrationForm::new(RegistrationMethod::Manual);
        form.set_card_input("4111111111111111");
        let _ = register(form.submit(Utc::now()));
        form.clear();
        assert_eq!(form.card_input(), "4111-1111-1111-1111");
    }
}
