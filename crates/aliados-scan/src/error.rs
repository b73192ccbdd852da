//! # Scan Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan Error Categories                             │
//! │                                                                         │
//! │  ┌───────────────────────────┐    ┌───────────────────────────────┐    │
//! │  │   CameraAccessError       │    │   DecodeError                 │    │
//! │  │   (terminal for session)  │    │   (per frame / per image)     │    │
//! │  │                           │    │                               │    │
//! │  │   InsecureContext         │    │   NotFound    ◄── live: noise │    │
//! │  │   PermissionDenied        │    │   UnreadableImage             │    │
//! │  │   NoCameras               │    │   Corrupt                     │    │
//! │  │   DeviceNotFound          │    │                               │    │
//! │  │   DeviceLost              │    │   image upload: surfaced once │    │
//! │  └───────────────────────────┘    └───────────────────────────────┘    │
//! │                    └──────────┬───────────┘                             │
//! │                           ScanError                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// The camera cannot be used. Ends the scan session; the merchant has to act
/// (grant permission, switch to HTTPS, plug a camera in) before retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraAccessError {
    /// Camera access is only allowed over HTTPS or on localhost.
    #[error("Camera access requires HTTPS or localhost (origin: {origin}).")]
    InsecureContext { origin: String },

    #[error("Camera permission denied.")]
    PermissionDenied,

    #[error("No cameras found.")]
    NoCameras,

    #[error("Camera not found: {0}")]
    DeviceNotFound(String),

    /// The device went away while it was streaming.
    #[error("Camera disconnected: {0}")]
    DeviceLost(String),
}

/// Nothing usable came out of a frame or image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No QR code in the frame. Expected on most live frames.
    #[error("No QR code found.")]
    NotFound,

    /// The file is not an image we can load.
    #[error("Could not read the image: {0}")]
    UnreadableImage(String),

    /// A QR grid was found but its content could not be recovered.
    #[error("QR code could not be decoded: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error(transparent)]
    Camera(#[from] CameraAccessError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ScanError {
    /// Returns true if this error must end a live scan session.
    ///
    /// Decode errors never do: the next frame may well be readable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::Camera(_))
    }
}

impl CameraAccessError {
    /// Maps an I/O failure while touching `device` to a camera error.
    pub fn from_io(device: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => CameraAccessError::PermissionDenied,
            std::io::ErrorKind::NotFound => CameraAccessError::DeviceNotFound(device.to_string()),
            _ => CameraAccessError::DeviceLost(format!("{}: {}", device, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(ScanError::from(CameraAccessError::PermissionDenied).is_fatal());
        assert!(!ScanError::from(DecodeError::NotFound).is_fatal());
        assert!(!ScanError::from(DecodeError::Corrupt("ecc".into())).is_fatal());
    }

    #[test]
    fn test_io_mapping() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(
            CameraAccessError::from_io("cam", &denied),
            CameraAccessError::PermissionDenied
        );
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(
            CameraAccessError::from_io("cam", &missing),
            CameraAccessError::DeviceNotFound("cam".into())
        );
    }
}
