use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::device::{Frame, PixelFormat};
use crate::error::Result;

/// Encode a raw frame as JPEG at the given quality.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Bytes> {
    let color = match frame.meta.format {
        PixelFormat::Rgb24 => ExtendedColorType::Rgb8,
        PixelFormat::Gray8 => ExtendedColorType::L8,
    };

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode(&frame.data, frame.meta.width, frame.meta.height, color)?;
    Ok(Bytes::from(out))
}
