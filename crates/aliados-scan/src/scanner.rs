//! # Scanner
//!
//! Owns one [`ScanSession`] and the camera it is using. Every state change
//! goes through the session; the scanner only carries out the resulting
//! [`ScanAction`]s (open, reopen, release).
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scanner (one per view, owned by the view controller)                   │
//! │  ├── ScanSession          pure state (aliados-core)                     │
//! │  ├── Arc<dyn CameraProvider>                                            │
//! │  ├── Arc<dyn QrDecoder>                                                 │
//! │  └── Option<DecodeLoop>   at most one camera open at any time           │
//! │                                                                         │
//! │  select_device(b) while scanning a:                                     │
//! │     release(a).await ──► a dropped ──► open(b) ──► spawn loop on b      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use aliados_core::scan::{DecodeEvent, ImageVerdict, ScanAction, ScanSession};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::camera::{CameraDevice, CameraProvider};
use crate::context::ensure_secure_context;
use crate::decoder::QrDecoder;
use crate::error::{CameraAccessError, ScanResult};
use crate::still::evaluate_image_file;
use crate::stream::DecodeLoop;

pub struct Scanner {
    provider: Arc<dyn CameraProvider>,
    decoder: Arc<dyn QrDecoder>,
    origin: String,
    session: ScanSession,
    devices: Vec<CameraDevice>,
    active: Option<DecodeLoop>,
}

impl Scanner {
    /// `origin` is where the portal is served from; it decides whether the
    /// camera may be used at all.
    pub fn new(
        provider: Arc<dyn CameraProvider>,
        decoder: Arc<dyn QrDecoder>,
        origin: impl Into<String>,
    ) -> Self {
        Scanner {
            provider,
            decoder,
            origin: origin.into(),
            session: ScanSession::new(),
            devices: Vec::new(),
            active: None,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn is_scanning(&self) -> bool {
        self.session.is_scanning()
    }

    /// Device the decode loop is currently attached to.
    pub fn active_device(&self) -> Option<&str> {
        self.active.as_ref().map(|l| l.device())
    }

    // -------------------------------------------------------------------------
    // Devices
    // -------------------------------------------------------------------------

    /// Enumerates cameras. Keeps the current selection if it still exists,
    /// otherwise selects the first device.
    pub async fn refresh_devices(&mut self) -> ScanResult<&[CameraDevice]> {
        ensure_secure_context(&self.origin)?;

        let devices = self.provider.list_devices().await?;
        let Some(first) = devices.first() else {
            return Err(CameraAccessError::NoCameras.into());
        };

        let keep = self
            .session
            .selected_device()
            .map(|s| devices.iter().any(|d| d.id == s))
            .unwrap_or(false);
        if !keep {
            let action = self.session.select_device(&first.id);
            self.devices = devices;
            self.apply(action).await?;
        } else {
            self.devices = devices;
        }

        debug!(count = self.devices.len(), "Cameras available");
        Ok(&self.devices)
    }

    /// Switches cameras. While scanning, the old camera is released before
    /// the new one is opened.
    pub async fn select_device(&mut self, device_id: &str) -> ScanResult<()> {
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(CameraAccessError::DeviceNotFound(device_id.to_string()).into());
        }
        let action = self.session.select_device(device_id);
        self.apply(action).await
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Opens the selected camera and starts decoding.
    ///
    /// Camera access errors are terminal for this attempt: the session goes
    /// back to idle and nothing is retried.
    pub async fn start(&mut self) -> ScanResult<()> {
        ensure_secure_context(&self.origin)?;
        if self.devices.is_empty() {
            self.refresh_devices().await?;
        }
        let action = self.session.start(None);
        self.apply(action).await
    }

    pub async fn stop(&mut self) {
        let action = self.session.stop();
        if let Err(e) = self.apply(action).await {
            warn!(error = %e, "Unexpected error while stopping scanner");
        }
        self.release().await;
    }

    /// Waits for the next thing the view has to react to.
    ///
    /// Not-found frames are swallowed here. Returns `None` when no camera
    /// is open.
    ///
    /// Cancel safe: the only await is on the event stream, so dropping this
    /// future never loses a decoded card. After `HandOff` or `Release` the
    /// camera is still attached; call [`release_if_stopped`](Self::release_if_stopped).
    pub async fn next_action(&mut self) -> Option<ScanAction> {
        loop {
            let active = self.active.as_mut()?;
            let device = active.device().to_string();

            let action = match active.next().await {
                Some(DecodeEvent::NotFound) => continue,
                Some(event) => self.session.handle(&device, event),
                None => self.session.handle(
                    &device,
                    DecodeEvent::Fatal("Camera stream ended.".to_string()),
                ),
            };

            match &action {
                ScanAction::None => continue,
                ScanAction::HandOff(card) => {
                    info!(device = %device, card = %card.masked(), "Card read, scanner locked");
                }
                ScanAction::Release { error } => {
                    warn!(device = %device, error = ?error, "Scan session ended by camera");
                }
                _ => {}
            }
            return Some(action);
        }
    }

    /// Releases the camera once the session has left scanning (locked on a
    /// card or ended by the camera). No-op while scanning.
    pub async fn release_if_stopped(&mut self) {
        if !self.session.is_scanning() {
            self.release().await;
        }
    }

    /// One-shot decode of an uploaded image. Never touches the session.
    pub async fn decode_image(&self, path: &Path) -> ImageVerdict {
        evaluate_image_file(path, self.decoder.as_ref()).await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn apply(&mut self, action: ScanAction) -> ScanResult<()> {
        match action {
            ScanAction::Open { device } | ScanAction::Reopen { device } => {
                self.release().await;
                match self.provider.open(&device).await {
                    Ok(source) => {
                        info!(device = %device, "Camera opened");
                        self.active = Some(DecodeLoop::spawn(source, self.decoder.clone()));
                        Ok(())
                    }
                    Err(e) => {
                        warn!(device = %device, error = %e, "Could not open camera");
                        self.session.stop();
                        Err(e)
                    }
                }
            }
            ScanAction::Release { .. } => {
                self.release().await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn release(&mut self) {
        if let Some(active) = self.active.take() {
            active.release().await;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
