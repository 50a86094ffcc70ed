// Decoding uploads and encoding results with the image crate.

use image::RgbaImage;
use std::io::Cursor;

use crate::error::ApiError;

// Decodes the uploaded bytes into an RGBA raster. The format is sniffed from
// the content itself, so a PNG uploaded under a .jpg name still decodes; only
// genuinely undecodable content fails.
pub fn decode_upload(file_data: &[u8]) -> Result<RgbaImage, ApiError> {
    let dyn_img = image::load_from_memory(file_data)
        .map_err(|e| ApiError::DecodeFailed(format!("Failed to decode uploaded image: {}", e)))?;

    Ok(dyn_img.to_rgba8())
}

// Encodes the processed raster as PNG. RGBA throughout, since the whole point
// of the service is the transparent background.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ApiError> {
    let mut buffer = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut buffer,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| ApiError::EncodeFailed(format!("PNG encoding failed: {}", e)))?;

    Ok(buffer.into_inner())
}

// First bytes of every PNG stream.
pub const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample_png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([200, 100, 50, 255]));
        encode_png(&img).unwrap()
    }

    #[test]
    fn decodes_png_content() {
        let decoded = decode_upload(&sample_png_bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn decodes_jpeg_content() {
        let rgb = image::RgbImage::from_pixel(4, 4, image::Rgb([128, 128, 128]));
        let mut buffer = Cursor::new(Vec::new());
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 90)
            .encode(rgb.as_raw(), 4, 4, image::ExtendedColorType::Rgb8)
            .unwrap();

        let decoded = decode_upload(&buffer.into_inner()).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn rejects_non_image_content() {
        let err = decode_upload(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ApiError::DecodeFailed(_)));
    }

    #[test]
    fn encoded_png_starts_with_signature() {
        let bytes = sample_png_bytes();
        assert_eq!(&bytes[..4], &PNG_SIGNATURE);
    }

    #[test]
    fn encoding_preserves_transparency() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));

        let decoded = decode_upload(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded.get_pixel(1, 1).0[3], 0);
        assert_eq!(decoded.get_pixel(0, 0).0[3], 255);
    }
}
