//! # aliados-scan: QR Acquisition for the Aliados Merchant Portal
//!
//! Gets a candidate card number out of a live camera or a still image.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        QR Acquisition Layer                             │
//! │                                                                         │
//! │  LIVE PATH                                                              │
//! │  ─────────                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                 │
//! │  │CameraProvider│──►│ FrameSource  │──►│  DecodeLoop  │──► DecodeEvent  │
//! │  │ (folder, …)  │   │ (exclusive)  │   │ (cancellable │    stream       │
//! │  └──────────────┘   └──────────────┘   │  Stream)     │       │         │
//! │         ▲                              └──────────────┘       ▼         │
//! │         │ secure-context check                         ┌─────────────┐  │
//! │         └───────────────────────────────────────────── │   Scanner   │  │
//! │                                                        │ ScanSession │  │
//! │                                                        └──────┬──────┘  │
//! │                                                  Display / HandOff /    │
//! │                                                  Release to the view    │
//! │                                                                         │
//! │  STILL PATH                                                             │
//! │  ──────────                                                             │
//! │  file ──► luma frame ──► QrDecoder ──► ImageVerdict (never submits)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`camera`] - Camera provider/frame source traits, folder-backed camera
//! - [`context`] - Secure-context rule (HTTPS or localhost)
//! - [`decoder`] - `QrDecoder` trait and the `rqrr` implementation
//! - [`error`] - Camera access and decode errors
//! - [`scanner`] - `Scanner`, the per-view controller
//! - [`still`] - Uploaded image decoding
//! - [`stream`] - The decode loop as a `Stream`

pub mod camera;
pub mod context;
pub mod decoder;
pub mod error;
pub mod scanner;
pub mod still;
pub mod stream;

pub use camera::{CameraDevice, CameraProvider, FolderCameraProvider, Frame, FrameSource};
pub use decoder::{QrDecoder, RqrrDecoder};
pub use error::{CameraAccessError, DecodeError, ScanError, ScanResult};
pub use scanner::Scanner;
pub use stream::DecodeLoop;
