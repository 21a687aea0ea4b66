//! PNG compression and base64 transport encoding.

use crate::error::EncodeError;
use crate::types::{PixelBuffer, PixelFormat};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use tracing::debug;

/// A compressed capture and its text form.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub png: Vec<u8>,
    pub base64: String,
}

/// Compress `buffer` to PNG and serialize it as unpadded single-line base64.
pub fn encode(buffer: Option<&PixelBuffer>) -> Result<EncodedImage, EncodeError> {
    let Some(buffer) = buffer else {
        debug!("Image was not initialized.");
        return Err(EncodeError::NullInput);
    };

    let png = encode_png(buffer)?;
    debug!("Size of screenshot image stream is {}", png.len());
    let base64 = STANDARD_NO_PAD.encode(&png);
    Ok(EncodedImage { png, base64 })
}

/// Convenience wrapper returning only the transport text.
pub fn encode_base64_png(buffer: Option<&PixelBuffer>) -> Result<String, EncodeError> {
    encode(buffer).map(|encoded| encoded.base64)
}

/// Decode transport text produced by [`encode`] back into PNG bytes.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD_NO_PAD.decode(text)
}

fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, EncodeError> {
    let row_len = buffer.width as usize * PixelBuffer::BYTES_PER_PIXEL;
    if buffer.stride < row_len {
        return Err(EncodeError::MalformedBuffer(format!(
            "stride {} is shorter than a row of {} bytes",
            buffer.stride, row_len
        )));
    }
    let required = buffer.stride * (buffer.height as usize).saturating_sub(1) + row_len;
    if buffer.height == 0 || buffer.data.len() < required {
        return Err(EncodeError::MalformedBuffer(format!(
            "{} bytes cannot hold {}x{} pixels",
            buffer.data.len(),
            buffer.width,
            buffer.height
        )));
    }

    let (pixels, color_type) = match buffer.format {
        PixelFormat::Bgra => {
            let mut pixels = Vec::with_capacity(buffer.width as usize * buffer.height as usize * 4);
            for row in buffer.rows() {
                for bgra in row.chunks_exact(4) {
                    pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
                }
            }
            (pixels, ColorType::Rgba8)
        }
        PixelFormat::Bgrx => {
            let mut pixels = Vec::with_capacity(buffer.width as usize * buffer.height as usize * 3);
            for row in buffer.rows() {
                for bgrx in row.chunks_exact(4) {
                    pixels.extend_from_slice(&[bgrx[2], bgrx[1], bgrx[0]]);
                }
            }
            (pixels, ColorType::Rgb8)
        }
    };

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, buffer.width, buffer.height, color_type)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_null_input() {
        assert!(matches!(encode(None), Err(EncodeError::NullInput)));
    }

    #[test]
    fn test_text_is_unpadded_single_line() {
        let mut buffer = PixelBuffer::allocate(7, 5, PixelFormat::Bgra).unwrap();
        buffer.set_pixel(3, 2, 0x80FF_0000);
        let text = encode_base64_png(Some(&buffer)).unwrap();

        assert!(!text.is_empty());
        assert!(!text.contains('='));
        assert!(!text.contains('\n') && !text.contains('\r'));
        assert_eq!(decode_base64(&text).unwrap()[..8], PNG_SIGNATURE);
    }

    #[test]
    fn test_alpha_and_channel_order_survive() {
        let mut buffer = PixelBuffer::allocate(2, 1, PixelFormat::Bgra).unwrap();
        // B=0x11 G=0x22 R=0x33 A=0x44
        buffer.set_pixel(1, 0, 0x4433_2211);
        let encoded = encode(Some(&buffer)).unwrap();

        let decoded = image::load_from_memory(&encoded.png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 0).0, [0x33, 0x22, 0x11, 0x44]);
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_bgrx_is_written_without_alpha() {
        let mut buffer = PixelBuffer::allocate(1, 1, PixelFormat::Bgrx).unwrap();
        buffer.set_pixel(0, 0, 0x0033_2211);
        let encoded = encode(Some(&buffer)).unwrap();

        let decoded = image::load_from_memory(&encoded.png).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0).0, [0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_padded_stride_is_skipped() {
        let buffer = PixelBuffer {
            width: 1,
            height: 2,
            stride: 8,
            format: PixelFormat::Bgra,
            data: vec![1, 2, 3, 255, 9, 9, 9, 9, 4, 5, 6, 255, 9, 9, 9, 9],
        };
        let encoded = encode(Some(&buffer)).unwrap();
        let decoded = image::load_from_memory(&encoded.png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 1).0, [6, 5, 4, 255]);
    }

    #[test]
    fn test_truncated_data_is_rejected() {
        let buffer = PixelBuffer {
            width: 4,
            height: 4,
            stride: 16,
            format: PixelFormat::Bgra,
            data: vec![0; 20],
        };
        assert!(matches!(
            encode(Some(&buffer)),
            Err(EncodeError::MalformedBuffer(_))
        ));
    }
}
