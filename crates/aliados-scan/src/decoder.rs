//! # QR Decoder
//!
//! [`QrDecoder`] turns one greyscale frame into the text of the first QR
//! code found in it. [`RqrrDecoder`] is the real implementation; tests swap
//! in fakes.

use tracing::trace;

use crate::camera::Frame;
use crate::error::DecodeError;

/// A version 1 QR code is 21 modules wide; nothing smaller can hold one.
const MIN_SIDE: u32 = 21;

pub trait QrDecoder: Send + Sync {
    /// Decodes the first readable QR code in `frame`.
    ///
    /// `DecodeError::NotFound` is the normal answer for most live frames.
    fn decode(&self, frame: &Frame) -> Result<String, DecodeError>;
}

/// QR decoding with `rqrr` (grid detection + Reed-Solomon correction).
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        RqrrDecoder
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &Frame) -> Result<String, DecodeError> {
        if frame.width < MIN_SIDE || frame.height < MIN_SIDE {
            return Err(DecodeError::NotFound);
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width as usize,
            frame.height as usize,
            |x, y| frame.pixel(x, y),
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(DecodeError::NotFound);
        }

        let mut last_error = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(content),
                Err(e) => {
                    trace!(error = ?e, "QR grid found but not decodable");
                    last_error = Some(format!("{:?}", e));
                }
            }
        }

        Err(DecodeError::Corrupt(
            last_error.unwrap_or_else(|| "unknown".to_string()),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Greyscale frame holding a rendered QR code for `text`.
    pub(crate) fn qr_frame(text: &str) -> Frame {
        let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
        let img = code
            .render::<image::Luma<u8>>()
            .module_dimensions(4, 4)
            .build();
        let (width, height) = img.dimensions();
        Frame {
            width,
            height,
            luma: img.into_raw(),
        }
    }

    #[test]
    fn test_decodes_rendered_card_code() {
        let decoder = RqrrDecoder::new();
        assert_eq!(
            decoder.decode(&qr_frame("4111111111111111")),
            Ok("4111111111111111".to_string())
        );
        assert_eq!(
            decoder.decode(&qr_frame("4111-1111-1111-1111")),
            Ok("4111-1111-1111-1111".to_string())
        );
    }

    #[test]
    fn test_blank_frame_is_not_found() {
        let decoder = RqrrDecoder::new();
        assert_eq!(decoder.decode(&Frame::blank()), Err(DecodeError::NotFound));
    }

    #[test]
    fn test_uniform_frame_is_not_found() {
        let frame = Frame {
            width: 64,
            height: 64,
            luma: vec![128; 64 * 64],
        };
        assert_eq!(RqrrDecoder::new().decode(&frame), Err(DecodeError::NotFound));
    }

    #[test]
    fn test_empty_frame_is_not_found() {
        let frame = Frame {
            width: 0,
            height: 0,
            luma: vec![],
        };
        assert_eq!(RqrrDecoder::new().decode(&frame), Err(DecodeError::NotFound));
    }
}
