//! # Scan Session
//!
//! The QR acquisition state machine, free of cameras and decoders. The I/O
//! side (`aliados-scan`) feeds it [`DecodeEvent`]s and carries out the
//! [`ScanAction`]s it returns.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Session                                    │
//! │                                                                         │
//! │            start(device)                                                │
//! │   ┌──────┐ ───────────────► ┌────────────────────┐                      │
//! │   │ Idle │                  │ Scanning{device}   │◄──┐ NotFound         │
//! │   └──────┘ ◄─────────────── └────────────────────┘───┘ (no change)      │
//! │      ▲     stop / Fatal        │        │    │                          │
//! │      │     (Release)           │        │    └── select_device(other)   │
//! │      │                         │        │        (Reopen, stays         │
//! │      │               Decoded   │        │         Scanning)             │
//! │      │               invalid   │        │ Decoded valid                 │
//! │      │             (Display)───┘        ▼                               │
//! │      │                           ┌──────────────────┐                   │
//! │      └──── start again ───────── │ Locked{card}     │ HandOff(card)     │
//! │                                  └──────────────────┘ + release camera  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A not-found frame is steady-state noise: it produces no action at all.

use crate::card::{format_card16, CardNumber};
use crate::notice::{Notice, IMAGE_INVALID_CARD, IMAGE_UNREADABLE, IMAGE_VALID};

// =============================================================================
// Events & Actions
// =============================================================================

/// One result of the decode loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A QR code was read. The text may be anything, not just a card.
    Decoded(String),
    /// Nothing readable in this frame.
    NotFound,
    /// The camera or decoder failed for good. Ends the session.
    Fatal(String),
}

/// What the I/O layer must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAction {
    None,
    /// Open the camera and start the decode loop.
    Open { device: String },
    /// Release the current camera, then open `device`.
    Reopen { device: String },
    /// Release the camera. `error` is shown to the merchant when present.
    Release { error: Option<String> },
    /// Show best-effort formatted text in the card field; keep scanning.
    Display(String),
    /// Release the camera and pass the card to the flow owning the view.
    HandOff(CardNumber),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning { device: String },
    Locked { card: CardNumber },
}

// =============================================================================
// Scan Session
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    state: ScanState,
    selected: Option<String>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn selected_device(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, ScanState::Scanning { .. })
    }

    /// Starts scanning on `device`, or on the previously selected one.
    ///
    /// Returns `None` when already scanning or when no device is known.
    pub fn start(&mut self, device: Option<&str>) -> ScanAction {
        if self.is_scanning() {
            return ScanAction::None;
        }
        if let Some(device) = device {
            self.selected = Some(device.to_string());
        }
        let Some(device) = self.selected.clone() else {
            return ScanAction::None;
        };
        self.state = ScanState::Scanning {
            device: device.clone(),
        };
        ScanAction::Open { device }
    }

    /// Changes the selected camera. While scanning this re-attaches the loop
    /// to the new device without leaving `Scanning`.
    pub fn select_device(&mut self, device: &str) -> ScanAction {
        let changed = self.selected.as_deref() != Some(device);
        self.selected = Some(device.to_string());

        match &self.state {
            ScanState::Scanning { .. } if changed => {
                self.state = ScanState::Scanning {
                    device: device.to_string(),
                };
                ScanAction::Reopen {
                    device: device.to_string(),
                }
            }
            _ => ScanAction::None,
        }
    }

    pub fn stop(&mut self) -> ScanAction {
        match self.state {
            ScanState::Scanning { .. } => {
                self.state = ScanState::Idle;
                ScanAction::Release { error: None }
            }
            ScanState::Locked { .. } => {
                self.state = ScanState::Idle;
                ScanAction::None
            }
            ScanState::Idle => ScanAction::None,
        }
    }

    /// Feeds one decode event from `device`.
    ///
    /// Events from a device other than the one currently scanning are stale
    /// (the loop was switched or stopped) and are dropped.
    pub fn handle(&mut self, device: &str, event: DecodeEvent) -> ScanAction {
        match &self.state {
            ScanState::Scanning { device: current } if current == device => {}
            _ => return ScanAction::None,
        }

        match event {
            DecodeEvent::NotFound => ScanAction::None,
            DecodeEvent::Fatal(message) => {
                self.state = ScanState::Idle;
                ScanAction::Release {
                    error: Some(message),
                }
            }
            DecodeEvent::Decoded(text) => match CardNumber::parse(&text) {
                Ok(card) => {
                    self.state = ScanState::Locked { card: card.clone() };
                    ScanAction::HandOff(card)
                }
                Err(_) => ScanAction::Display(format_card16(&text)),
            },
        }
    }
}

// =============================================================================
// Still Image Verdict
// =============================================================================

/// Result of checking the text decoded from an uploaded image.
///
/// Never auto-submits: even a valid card only fills the field and waits for
/// the merchant to press submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageVerdict {
    /// Decoded and valid.
    Valid(CardNumber),
    /// Decoded, but not a valid card. `display` is the formatted text.
    InvalidCard { display: String },
    /// Nothing could be decoded.
    Unreadable,
}

impl ImageVerdict {
    /// Classifies decoded image text (`None` when decoding failed).
    pub fn evaluate(decoded: Option<&str>) -> Self {
        let Some(text) = decoded else {
            return ImageVerdict::Unreadable;
        };
        match CardNumber::parse(text) {
            Ok(card) => ImageVerdict::Valid(card),
            Err(_) => ImageVerdict::InvalidCard {
                display: format_card16(text),
            },
        }
    }

    /// Text the card field should hold afterwards, if it changes.
    pub fn field_text(&self) -> Option<String> {
        match self {
            ImageVerdict::Valid(card) => Some(card.display()),
            ImageVerdict::InvalidCard { display } => Some(display.clone()),
            ImageVerdict::Unreadable => None,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            ImageVerdict::Valid(_) => Notice::info(IMAGE_VALID),
            ImageVerdict::InvalidCard { .. } => Notice::error(IMAGE_INVALID_CARD),
            ImageVerdict::Unreadable => Notice::error(IMAGE_UNREADABLE),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scanning(device: &str) -> ScanSession {
        let mut session = ScanSession::new();
        assert_eq!(
            session.start(Some(device)),
            ScanAction::Open {
                device: device.to_string()
            }
        );
        session
    }

    #[test]
    fn test_start_without_device_does_nothing() {
        let mut session = ScanSession::new();
        assert_eq!(session.start(None), ScanAction::None);
        assert_eq!(session.state(), &ScanState::Idle);
    }

    #[test]
    fn test_not_found_is_silent() {
        let mut session = scanning("cam-1");
        for _ in 0..50 {
            assert_eq!(session.handle("cam-1", DecodeEvent::NotFound), ScanAction::None);
        }
        assert!(session.is_scanning());
    }

    #[test]
    fn test_valid_decode_locks_and_hands_off() {
        let mut session = scanning("cam-1");
        let action = session.handle("cam-1", DecodeEvent::Decoded("4111111111111111".into()));
        let card = CardNumber::parse("4111111111111111").unwrap();
        assert_eq!(action, ScanAction::HandOff(card.clone()));
        assert_eq!(session.state(), &ScanState::Locked { card });

        // Locked: later decodes are not delivered.
        assert_eq!(
            session.handle("cam-1", DecodeEvent::Decoded("4111111111111111".into())),
            ScanAction::None
        );
    }

    #[test]
    fn test_invalid_decode_displays_and_keeps_scanning() {
        let mut session = scanning("cam-1");
        let action = session.handle("cam-1", DecodeEvent::Decoded("promo:12345678".into()));
        assert_eq!(action, ScanAction::Display("1234-5678".into()));
        assert!(session.is_scanning());
    }

    #[test]
    fn test_fatal_releases_with_error() {
        let mut session = scanning("cam-1");
        let action = session.handle("cam-1", DecodeEvent::Fatal("camera unplugged".into()));
        assert_eq!(
            action,
            ScanAction::Release {
                error: Some("camera unplugged".into())
            }
        );
        assert_eq!(session.state(), &ScanState::Idle);
    }

    #[test]
    fn test_switch_device_while_scanning() {
        let mut session = scanning("cam-1");
        assert_eq!(
            session.select_device("cam-2"),
            ScanAction::Reopen {
                device: "cam-2".into()
            }
        );
        assert!(session.is_scanning());

        // Stale events from the old device are dropped.
        assert_eq!(
            session.handle("cam-1", DecodeEvent::Decoded("4111111111111111".into())),
            ScanAction::None
        );
        assert!(session.is_scanning());

        // Same device again: nothing to do.
        assert_eq!(session.select_device("cam-2"), ScanAction::None);
    }

    #[test]
    fn test_select_while_idle_only_remembers() {
        let mut session = ScanSession::new();
        assert_eq!(session.select_device("cam-3"), ScanAction::None);
        assert_eq!(session.selected_device(), Some("cam-3"));
        assert_eq!(
            session.start(None),
            ScanAction::Open {
                device: "cam-3".into()
            }
        );
    }

    #[test]
    fn test_stop() {
        let mut session = scanning("cam-1");
        assert_eq!(session.stop(), ScanAction::Release { error: None });
        assert_eq!(session.stop(), ScanAction::None);
    }

    #[test]
    fn test_image_verdicts() {
        let valid = ImageVerdict::evaluate(Some("4111-1111-1111-1111"));
        assert!(matches!(valid, ImageVerdict::Valid(_)));
        assert_eq!(valid.notice().message, IMAGE_VALID);
        assert_eq!(valid.field_text().as_deref(), Some("4111-1111-1111-1111"));

        let invalid = ImageVerdict::evaluate(Some("1234567812345678"));
        assert_eq!(invalid.notice().message, IMAGE_INVALID_CARD);
        assert!(invalid.notice().is_error());

        let unreadable = ImageVerdict::evaluate(None);
        assert_eq!(unreadable.notice().message, IMAGE_UNREADABLE);
        assert_eq!(unreadable.field_text(), None);
    }
}
