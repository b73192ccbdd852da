//! # Scan Commands
//!
//! Bind the [`Scanner`] to whichever view is on screen.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ScanAction          View reaction                                      │
//! │  ──────────          ─────────────                                      │
//! │  Display(text)  ──►  card field = text, keep scanning                   │
//! │  HandOff(card)  ──►  release camera, card field = card, press submit    │
//! │  Release{error} ──►  release camera, error notice, back to idle         │
//! │                                                                         │
//! │  decode_image   ──►  card field + notice, never submits                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use aliados_core::scan::{ImageVerdict, ScanAction};
use aliados_core::Notice;
use aliados_gateway::Gateway;
use aliados_scan::{CameraDevice, Scanner};
use tracing::debug;

use super::{SubmitOutcome, View};
use crate::error::ApiError;
use crate::state::SessionState;

pub async fn list_cameras(scanner: &mut Scanner) -> Result<Vec<CameraDevice>, ApiError> {
    let devices = scanner.refresh_devices().await?;
    Ok(devices.to_vec())
}

/// Switches cameras; a running scan moves to the new device.
pub async fn select_camera(scanner: &mut Scanner, device_id: &str) -> Result<(), ApiError> {
    scanner.select_device(device_id).await?;
    Ok(())
}

/// Starts scanning. Camera errors end the attempt and are shown on the view.
pub async fn start_scan(scanner: &mut Scanner, view: &View) -> Result<(), ApiError> {
    if let Err(err) = scanner.start().await {
        let err = ApiError::from(err);
        view.set_notice(Notice::error(err.message.clone()));
        return Err(err);
    }
    Ok(())
}

pub async fn stop_scan(scanner: &mut Scanner) {
    scanner.stop().await;
}

/// Applies one scanner action to the view. A hand-off submits the view's
/// form, so the outcome of that submit is returned.
///
/// The submit runs to completion here; callers must not race this future
/// against anything that could drop it.
pub async fn handle_scan_action(
    scanner: &mut Scanner,
    action: ScanAction,
    view: &View,
    gateway: &dyn Gateway,
    session: &SessionState,
) -> Option<SubmitOutcome> {
    scanner.release_if_stopped().await;
    match action {
        ScanAction::Display(text) => {
            view.set_card_input(&text);
            None
        }
        ScanAction::HandOff(card) => {
            debug!(view = view.name(), card = %card.masked(), "Scanned card handed off");
            view.accept_scan(&card);
            Some(view.submit(gateway, session).await)
        }
        ScanAction::Release { error: Some(error) } => {
            view.set_notice(Notice::error(error));
            None
        }
        _ => None,
    }
}

/// Decodes an uploaded image into the view's card field.
pub async fn decode_image(scanner: &Scanner, path: &Path, view: &View) -> ImageVerdict {
    let verdict = scanner.decode_image(path).await;
    if let Some(text) = verdict.field_text() {
        view.set_card_input(&text);
    }
    view.set_notice(verdict.notice());
    verdict
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use aliados_core::notice::{IMAGE_UNREADABLE, REDEEM_SUCCESS};
    use aliados_core::{CardNumber, RegistrationMethod};

    use crate::commands::redeem::{load_offers, select_offer};
    use crate::commands::testing::{offers, signed_in, FakeGateway, OneCamera, TextDecoder};
    use crate::error::ErrorCode;
    use crate::state::{RedeemState, RegisterState};

    fn scanner(frames: &[&str], deny: bool) -> Scanner {
        let camera = if deny {
            OneCamera::denying()
        } else {
            OneCamera::new(frames)
        };
        Scanner::new(Arc::new(camera), Arc::new(TextDecoder), "https://portal.example")
    }

    async fn redeem_view(gateway: &FakeGateway, session: &SessionState) -> View {
        let redeem = RedeemState::new();
        load_offers(gateway, session, &redeem).await.unwrap();
        select_offer(&redeem, "7").unwrap();
        View::Redeem(redeem)
    }

    #[tokio::test]
    async fn test_scanned_card_auto_submits_redemption() {
        let gateway = FakeGateway::with_offers(offers());
        let session = signed_in(42);
        let view = redeem_view(&gateway, &session).await;
        let mut scanner = scanner(&["", "", "4111 1111 1111 1111"], false);

        start_scan(&mut scanner, &view).await.unwrap();
        let action = scanner.next_action().await.unwrap();
        assert_eq!(
            action,
            ScanAction::HandOff(CardNumber::parse("4111111111111111").unwrap())
        );

        let outcome = handle_scan_action(&mut scanner, action, &view, &gateway, &session).await;
        assert_eq!(outcome, Some(SubmitOutcome::Settled(Notice::success(REDEEM_SUCCESS))));
        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 1);
        assert!(!scanner.is_scanning());
        assert_eq!(scanner.active_device(), None);
    }

    #[tokio::test]
    async fn test_scanned_card_registers_on_qr_view() {
        let gateway = FakeGateway::default();
        let session = signed_in(42);
        let view = View::Register(RegisterState::new(RegistrationMethod::Qr));
        let mut scanner = scanner(&["4111111111111111"], false);

        start_scan(&mut scanner, &view).await.unwrap();
        let action = scanner.next_action().await.unwrap();
        handle_scan_action(&mut scanner, action, &view, &gateway, &session).await;

        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_decode_displays_without_submitting() {
        let gateway = FakeGateway::with_offers(offers());
        let session = signed_in(42);
        let view = redeem_view(&gateway, &session).await;
        let mut scanner = scanner(&["1234567812345678"], false);

        start_scan(&mut scanner, &view).await.unwrap();
        let action = scanner.next_action().await.unwrap();
        assert!(handle_scan_action(&mut scanner, action, &view, &gateway, &session).await.is_none());

        assert_eq!(view.card_input(), "1234-5678-1234-5678");
        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 0);
        assert!(scanner.is_scanning());
        stop_scan(&mut scanner).await;
    }

    /// Frames without a code change nothing on screen.
    #[tokio::test]
    async fn test_decode_noise_is_silent() {
        let gateway = FakeGateway::with_offers(offers());
        let session = signed_in(42);
        let view = redeem_view(&gateway, &session).await;
        view.set_card_input("4111");
        let before = view.notice();
        let mut scanner = scanner(&["", "", "", ""], false);

        start_scan(&mut scanner, &view).await.unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(50), scanner.next_action()).await;
        assert!(waited.is_err());

        assert_eq!(view.card_input(), "4111");
        assert_eq!(view.notice(), before);
        assert!(scanner.is_scanning());
        stop_scan(&mut scanner).await;
    }

    #[tokio::test]
    async fn test_permission_denied_shows_error() {
        let view = View::Register(RegisterState::new(RegistrationMethod::Qr));
        let mut scanner = scanner(&[], true);

        let err = start_scan(&mut scanner, &view).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CameraError);
        assert!(view.notice().unwrap().is_error());
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn test_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        std::fs::write(&path, b"not an image").unwrap();

        let view = View::Register(RegisterState::new(RegistrationMethod::Qr));
        view.set_card_input("4111");
        let scanner = scanner(&[], false);

        let verdict = decode_image(&scanner, &path, &view).await;
        assert_eq!(verdict, ImageVerdict::Unreadable);
        assert_eq!(view.notice(), Some(Notice::error(IMAGE_UNREADABLE)));
        assert_eq!(view.card_input(), "4111");
    }
}
