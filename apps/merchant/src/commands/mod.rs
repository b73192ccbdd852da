//! # Commands
//!
//! Everything a merchant can do, as functions over the shared state.
//! Each command turns a pure core intent into at most one gateway or
//! scanner call.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  redeem.rs    load_offers, select_offer, type_card, submit_redemption   │
//! │  register.rs  submit_registration, clear_registration                   │
//! │  scan.rs      list_cameras, start_scan, handle_scan_action,             │
//! │               decode_image                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod redeem;
pub mod register;
pub mod scan;

use aliados_core::{CardNumber, Notice, RegistrationMethod};
use aliados_gateway::Gateway;

use crate::error::ApiError;
use crate::state::{RedeemState, RegisterState, SessionState};

/// How a submit trigger ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A call for this form was already in flight; nothing was sent.
    Ignored,
    /// A precondition failed; nothing was sent.
    Rejected(ApiError),
    /// The gateway call settled and the form now shows this notice.
    Settled(Notice),
}

/// The form a view is bound to. Scan results land here.
#[derive(Debug, Clone)]
pub enum View {
    Redeem(RedeemState),
    Register(RegisterState),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Redeem(_) => "redeem",
            View::Register(state) => match state.method() {
                RegistrationMethod::Manual => "register",
                RegistrationMethod::Qr => "register-qr",
            },
        }
    }

    pub fn card_input(&self) -> String {
        match self {
            View::Redeem(state) => state.with_form(|f| f.card_input().to_string()),
            View::Register(state) => state.with_form(|f| f.card_input().to_string()),
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        match self {
            View::Redeem(state) => state.with_form(|f| f.notice().cloned()),
            View::Register(state) => state.with_form(|f| f.notice().cloned()),
        }
    }

    pub fn is_busy(&self) -> bool {
        match self {
            View::Redeem(state) => state.with_form(|f| f.is_busy()),
            View::Register(state) => state.with_form(|f| f.is_busy()),
        }
    }

    pub fn set_notice(&self, notice: Notice) {
        match self {
            View::Redeem(state) => state.with_form_mut(|f| f.set_notice(notice)),
            View::Register(state) => state.with_form_mut(|f| f.set_notice(notice)),
        }
    }

    /// Replaces the card field (paste, best-effort decode).
    pub fn set_card_input(&self, raw: &str) {
        match self {
            View::Redeem(state) => state.with_form_mut(|f| f.set_card_input(raw)),
            View::Register(state) => state.with_form_mut(|f| f.set_card_input(raw)),
        }
    }

    /// Keystroke in the card field; returns the new cursor.
    pub fn type_card(&self, value: &str, cursor: usize) -> usize {
        match self {
            View::Redeem(state) => state.with_form_mut(|f| f.type_card_input(value, cursor)),
            View::Register(state) => state.with_form_mut(|f| f.type_card_input(value, cursor)),
        }
    }

    pub fn accept_scan(&self, card: &CardNumber) {
        match self {
            View::Redeem(state) => state.with_form_mut(|f| f.accept_scan(card)),
            View::Register(state) => state.with_form_mut(|f| f.accept_scan(card)),
        }
    }

    /// Presses the view's submit button.
    pub async fn submit(&self, gateway: &dyn Gateway, session: &SessionState) -> SubmitOutcome {
        match self {
            View::Redeem(state) => redeem::submit_redemption(gateway, session, state).await,
            View::Register(state) => register::submit_registration(gateway, state).await,
        }
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use aliados_core::{
        BusinessId, CardRegistration, MerchantSession, OfferId, OfferSummary, RedemptionAttempt,
        RedemptionReceipt, RegistrationReceipt,
    };
    use aliados_gateway::{Gateway, GatewayError, GatewayResult, MemorySessionStore};
    use aliados_scan::{
        CameraAccessError, CameraDevice, CameraProvider, DecodeError, Frame, FrameSource,
        QrDecoder, ScanResult,
    };
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::state::SessionState;

    /// Scripted gateway that counts calls and can hold them open.
    #[derive(Default)]
    pub(crate) struct FakeGateway {
        pub offers: Mutex<Option<GatewayResult<Vec<OfferSummary>>>>,
        pub redeem_reply: Mutex<Option<GatewayResult<RedemptionReceipt>>>,
        pub register_reply: Mutex<Option<GatewayResult<RegistrationReceipt>>>,
        pub redeem_calls: AtomicUsize,
        pub register_calls: AtomicUsize,
        pub redeemed: Mutex<Vec<RedemptionAttempt>>,
        pub registered: Mutex<Vec<CardRegistration>>,
        /// When set, calls wait for a permit before answering.
        pub gate: Option<Arc<Notify>>,
    }

    impl FakeGateway {
        pub fn with_offers(offers: Vec<OfferSummary>) -> Self {
            FakeGateway {
                offers: Mutex::new(Some(Ok(offers))),
                ..Default::default()
            }
        }

        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn redeem_fails(self, err: GatewayError) -> Self {
            *self.redeem_reply.lock().unwrap() = Some(Err(err));
            self
        }

        pub fn register_replies(self, reply: GatewayResult<RegistrationReceipt>) -> Self {
            *self.register_reply.lock().unwrap() = Some(reply);
            self
        }

        async fn wait_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn list_active_offers(&self, _: BusinessId) -> GatewayResult<Vec<OfferSummary>> {
            self.offers
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn redeem_offer(
            &self,
            attempt: &RedemptionAttempt,
        ) -> GatewayResult<RedemptionReceipt> {
            self.redeem_calls.fetch_add(1, Ordering::SeqCst);
            self.redeemed.lock().unwrap().push(attempt.clone());
            self.wait_gate().await;
            self.redeem_reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(RedemptionReceipt::default()))
        }

        async fn register_card(
            &self,
            registration: &CardRegistration,
        ) -> GatewayResult<RegistrationReceipt> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            self.registered.lock().unwrap().push(registration.clone());
            self.wait_gate().await;
            self.register_reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(RegistrationReceipt::default()))
        }
    }

    pub(crate) fn offers() -> Vec<OfferSummary> {
        vec![
            OfferSummary {
                id: OfferId(7),
                title: "2x1 Coffee".into(),
            },
            OfferSummary {
                id: OfferId(9),
                title: "Free dessert".into(),
            },
        ]
    }

    pub(crate) fn signed_in(id: i64) -> SessionState {
        SessionState::new(Arc::new(MemorySessionStore::new(
            MerchantSession::for_business(BusinessId(id)),
        )))
    }

    pub(crate) fn signed_out() -> SessionState {
        SessionState::new(Arc::new(MemorySessionStore::default()))
    }

    /// Frames carry their QR text as raw bytes; an empty frame has no code.
    pub(crate) fn text_frame(text: &str) -> Frame {
        Frame {
            width: text.len() as u32,
            height: 1,
            luma: text.as_bytes().to_vec(),
        }
    }

    /// Reads frames built by [`text_frame`].
    pub(crate) struct TextDecoder;

    impl QrDecoder for TextDecoder {
        fn decode(&self, frame: &Frame) -> Result<String, DecodeError> {
            if frame.luma.is_empty() {
                return Err(DecodeError::NotFound);
            }
            String::from_utf8(frame.luma.clone()).map_err(|e| DecodeError::Corrupt(e.to_string()))
        }
    }

    struct Script {
        device: String,
        frames: VecDeque<Frame>,
    }

    #[async_trait]
    impl FrameSource for Script {
        fn device(&self) -> &str {
            &self.device
        }

        async fn next_frame(&mut self) -> ScanResult<Frame> {
            match self.frames.pop_front() {
                Some(frame) => Ok(frame),
                None => std::future::pending().await,
            }
        }
    }

    /// A single counter camera that plays its frames once, then idles.
    pub(crate) struct OneCamera {
        frames: Mutex<Vec<Frame>>,
        deny: bool,
    }

    impl OneCamera {
        pub fn new(frames: &[&str]) -> Self {
            OneCamera {
                frames: Mutex::new(frames.iter().map(|t| text_frame(t)).collect()),
                deny: false,
            }
        }

        pub fn denying() -> Self {
            OneCamera {
                frames: Mutex::new(Vec::new()),
                deny: true,
            }
        }
    }

    #[async_trait]
    impl CameraProvider for OneCamera {
        async fn list_devices(&self) -> ScanResult<Vec<CameraDevice>> {
            Ok(vec![CameraDevice {
                id: "counter".into(),
                label: "Counter camera".into(),
            }])
        }

        async fn open(&self, device_id: &str) -> ScanResult<Box<dyn FrameSource>> {
            if self.deny {
                return Err(CameraAccessError::PermissionDenied.into());
            }
            Ok(Box::new(Script {
                device: device_id.to_string(),
                frames: std::mem::take(&mut *self.frames.lock().unwrap()).into(),
            }))
        }
    }
}
