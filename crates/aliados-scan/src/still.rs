//! # Still Images
//!
//! The upload path: one file, one decode attempt, one verdict.
//!
//! ```text
//!   file ──read──► bytes ──image──► luma frame ──QrDecoder──► text
//!                                                               │
//!                                          ImageVerdict::evaluate (core)
//! ```
//!
//! Unlike the live path, nothing here submits anything. A valid card only
//! fills the field; the merchant still has to press submit.

use std::path::Path;

use aliados_core::scan::ImageVerdict;
use tracing::{debug, warn};

use crate::camera::Frame;
use crate::decoder::QrDecoder;
use crate::error::DecodeError;

/// Loads any supported image format into a greyscale frame.
pub fn frame_from_bytes(bytes: &[u8]) -> Result<Frame, DecodeError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| DecodeError::UnreadableImage(e.to_string()))?;
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();

    Ok(Frame {
        width,
        height,
        luma: luma.into_raw(),
    })
}

/// Reads and loads an image file.
pub async fn load_frame_file(path: &Path) -> Result<Frame, DecodeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DecodeError::UnreadableImage(format!("{}: {}", path.display(), e)))?;
    frame_from_bytes(&bytes)
}

/// Decodes the QR code in an image file.
pub async fn decode_image_file(path: &Path, decoder: &dyn QrDecoder) -> Result<String, DecodeError> {
    let frame = load_frame_file(path).await?;
    decoder.decode(&frame)
}

/// Full upload path: decode the file and classify the result.
pub async fn evaluate_image_file(path: &Path, decoder: &dyn QrDecoder) -> ImageVerdict {
    match decode_image_file(path, decoder).await {
        Ok(text) => {
            let verdict = ImageVerdict::evaluate(Some(&text));
            debug!(path = %path.display(), valid = matches!(verdict, ImageVerdict::Valid(_)), "Decoded uploaded image");
            verdict
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not decode uploaded image");
            ImageVerdict::Unreadable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliados_core::CardNumber;

    use crate::decoder::RqrrDecoder;

    /// Reads any frame that is not fully black as a valid card.
    struct LitFrameDecoder;

    impl QrDecoder for LitFrameDecoder {
        fn decode(&self, frame: &Frame) -> Result<String, DecodeError> {
            if frame.luma.iter().all(|&b| b == 0) {
                return Err(DecodeError::NotFound);
            }
            Ok("4111111111111111".to_string())
        }
    }

    fn write_png(dir: &Path, name: &str, shade: u8) -> std::path::PathBuf {
        let path = dir.join(name);
        image::GrayImage::from_pixel(4, 4, image::Luma([shade]))
            .save(&path)
            .unwrap();
        path
    }

    /// Saves a rendered QR code for `text` as a PNG.
    fn write_qr_png(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let frame = crate::decoder::tests::qr_frame(text);
        let path = dir.join(name);
        image::GrayImage::from_raw(frame.width, frame.height, frame.luma)
            .unwrap()
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_real_qr_png_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = RqrrDecoder::new();

        let card = write_qr_png(dir.path(), "card.png", "4111111111111111");
        assert_eq!(
            evaluate_image_file(&card, &decoder).await,
            ImageVerdict::Valid(CardNumber::parse("4111111111111111").unwrap())
        );

        let promo = write_qr_png(dir.path(), "promo.png", "1234567812345678");
        assert_eq!(
            evaluate_image_file(&promo, &decoder).await,
            ImageVerdict::InvalidCard {
                display: "1234-5678-1234-5678".into()
            }
        );
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let err = frame_from_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, DecodeError::UnreadableImage(_)));
    }

    #[tokio::test]
    async fn test_load_png_as_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "frame.png", 77);
        let frame = load_frame_file(&path).await.unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));
        assert!(frame.luma.iter().all(|&b| b == 77));
    }

    #[tokio::test]
    async fn test_verdicts() {
        let dir = tempfile::tempdir().unwrap();

        let readable = write_png(dir.path(), "card.png", 255);
        assert!(matches!(
            evaluate_image_file(&readable, &LitFrameDecoder).await,
            ImageVerdict::Valid(_)
        ));

        let dark = write_png(dir.path(), "dark.png", 0);
        assert_eq!(
            evaluate_image_file(&dark, &LitFrameDecoder).await,
            ImageVerdict::Unreadable
        );

        let missing = dir.path().join("missing.png");
        assert_eq!(
            evaluate_image_file(&missing, &LitFrameDecoder).await,
            ImageVerdict::Unreadable
        );
    }
}
