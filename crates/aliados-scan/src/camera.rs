//! # Cameras
//!
//! The seam between the scanner and whatever produces frames.
//!
//! ## Traits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CameraProvider                                                         │
//! │  ├── list_devices()  ──► [CameraDevice { id, label }]                  │
//! │  └── open(id)        ──► Box<dyn FrameSource>                          │
//! │                              │                                          │
//! │                              │ next_frame() ──► Frame (greyscale)       │
//! │                              │                                          │
//! │                              └── dropped ──► device released            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `FrameSource` holds the device for as long as it lives. The scanner
//! drops the old source before opening another one, so two streams never
//! run at the same time.
//!
//! [`FolderCameraProvider`] is the provider the merchant console ships with:
//! every subdirectory of a root folder is a camera, and the images inside it
//! are its frames, replayed in name order at a fixed interval. Dropping a
//! photo of a card QR into the folder is how it "sees" a card.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CameraAccessError, ScanResult};
use crate::still::load_frame_file;

/// Optional file inside a camera folder holding its human-readable label.
pub const LABEL_FILE: &str = "label.txt";

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

// =============================================================================
// Frame & Device
// =============================================================================

/// One greyscale frame, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl Frame {
    /// A 1x1 white frame. What an empty camera "sees".
    pub fn blank() -> Self {
        Frame {
            width: 1,
            height: 1,
            luma: vec![255],
        }
    }

    /// Luma at `(x, y)`; out-of-range reads are white.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.luma
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or(255)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

/// Names devices, falling back to `Camera N` (1-based) when a device
/// reports no label. Order is preserved; the first entry is the default.
pub fn label_devices(raw: Vec<(String, Option<String>)>) -> Vec<CameraDevice> {
    raw.into_iter()
        .enumerate()
        .map(|(i, (id, label))| CameraDevice {
            id,
            label: label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format!("Camera {}", i + 1)),
        })
        .collect()
}

// =============================================================================
// Traits
// =============================================================================

#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Enumerates the available cameras.
    async fn list_devices(&self) -> ScanResult<Vec<CameraDevice>>;

    /// Opens `device_id` for exclusive use.
    async fn open(&self, device_id: &str) -> ScanResult<Box<dyn FrameSource>>;
}

#[async_trait]
pub trait FrameSource: Send {
    fn device(&self) -> &str;

    /// Waits for the next frame.
    ///
    /// Decode errors are per-frame; camera errors mean the stream is gone.
    async fn next_frame(&mut self) -> ScanResult<Frame>;
}

// =============================================================================
// Folder Camera
// =============================================================================

pub struct FolderCameraProvider {
    root: PathBuf,
    frame_interval: Duration,
}

impl FolderCameraProvider {
    pub fn new(root: impl Into<PathBuf>, frame_interval: Duration) -> Self {
        FolderCameraProvider {
            root: root.into(),
            frame_interval,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Device ids are folder names, never paths.
fn is_plain_name(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

#[async_trait]
impl CameraProvider for FolderCameraProvider {
    async fn list_devices(&self) -> ScanResult<Vec<CameraDevice>> {
        let root = self.root.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| CameraAccessError::from_io(&root, &e))?;

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CameraAccessError::from_io(&root, &e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            let label = tokio::fs::read_to_string(entry.path().join(LABEL_FILE))
                .await
                .ok();
            found.push((id, label));
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(root = %root, count = found.len(), "Enumerated folder cameras");
        Ok(label_devices(found))
    }

    async fn open(&self, device_id: &str) -> ScanResult<Box<dyn FrameSource>> {
        if !is_plain_name(device_id) {
            return Err(CameraAccessError::DeviceNotFound(device_id.to_string()).into());
        }

        let dir = self.root.join(device_id);
        let meta = tokio::fs::metadata(&dir)
            .await
            .map_err(|e| CameraAccessError::from_io(device_id, &e))?;
        if !meta.is_dir() {
            return Err(CameraAccessError::DeviceNotFound(device_id.to_string()).into());
        }

        debug!(device = %device_id, "Opened folder camera");
        Ok(Box::new(FolderFrameSource {
            device: device_id.to_string(),
            dir,
            interval: self.frame_interval,
            pending: VecDeque::new(),
            started: false,
        }))
    }
}

struct FolderFrameSource {
    device: String,
    dir: PathBuf,
    interval: Duration,
    pending: VecDeque<PathBuf>,
    started: bool,
}

impl FolderFrameSource {
    async fn list_frames(&self) -> ScanResult<VecDeque<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| CameraAccessError::DeviceLost(format!("{}: {}", self.device, e)))?;

        let mut frames = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_frame = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| FRAME_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
                .unwrap_or(false);
            if is_frame {
                frames.push(path);
            }
        }
        frames.sort();
        Ok(frames.into())
    }
}

#[async_trait]
impl FrameSource for FolderFrameSource {
    fn device(&self) -> &str {
        &self.device
    }

    async fn next_frame(&mut self) -> ScanResult<Frame> {
        if self.started {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;

        if self.pending.is_empty() {
            self.pending = self.list_frames().await?;
        }

        match self.pending.pop_front() {
            Some(path) => Ok(load_frame_file(&path).await?),
            None => Ok(Frame::blank()),
        }
    }
}

impl Drop for FolderFrameSource {
    fn drop(&mut self) {
        debug!(device = %self.device, "Released folder camera");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
