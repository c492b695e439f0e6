//! Decode, bound and re-encode images as JPEG previews.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder as _, ImageReader};
use nurture_application::{AttachmentLimits, ImageProcessingError, ImageProcessor};
use nurture_domain::{ImageFile, ImagePreview};
use std::io::Cursor;
use tracing::debug;

const PREVIEW_MIME: &str = "image/jpeg";

/// [`ImageProcessor`] backed by the `image` crate.
///
/// Images larger than the configured bounds are scaled down keeping their
/// aspect ratio; smaller ones keep their size. The result is always JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterImageProcessor;

impl RasterImageProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl ImageProcessor for RasterImageProcessor {
    fn prepare_preview(
        &self,
        file: &ImageFile,
        limits: &AttachmentLimits,
    ) -> Result<ImagePreview, ImageProcessingError> {
        let img = decode(&file.bytes)?;
        let (max_w, max_h) = (limits.max_width.max(1), limits.max_height.max(1));

        let img = if img.width() > max_w || img.height() > max_h {
            debug!(
                "Resizing {} from {}x{} to fit {}x{}",
                file.name,
                img.width(),
                img.height(),
                max_w,
                max_h
            );
            img.resize(max_w, max_h, FilterType::Triangle)
        } else {
            img
        };

        let jpeg = encode_jpeg(&img, limits.jpeg_quality.clamp(1, 100))?;
        Ok(ImagePreview {
            data_url: format!("data:{};base64,{}", PREVIEW_MIME, STANDARD.encode(jpeg)),
            mime_type: PREVIEW_MIME.to_string(),
            width: img.width(),
            height: img.height(),
        })
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageProcessingError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageProcessingError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| ImageProcessingError::Decode(e.to_string()))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageProcessingError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
        .map_err(|e| ImageProcessingError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> ImageFile {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageFile::new("photo.png", "image/png", bytes)
    }

    fn jpeg_bytes(preview: &ImagePreview) -> Vec<u8> {
        let encoded = preview
            .data_url
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        STANDARD.decode(encoded).unwrap()
    }

    #[test]
    fn test_large_image_is_scaled_keeping_aspect_ratio() {
        let limits = AttachmentLimits {
            max_width: 100,
            max_height: 100,
            ..Default::default()
        };
        let preview = RasterImageProcessor
            .prepare_preview(&png(400, 200), &limits)
            .unwrap();
        assert_eq!((preview.width, preview.height), (100, 50));
        assert_eq!(preview.mime_type, "image/jpeg");
        assert_eq!(&jpeg_bytes(&preview)[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let preview = RasterImageProcessor
            .prepare_preview(&png(40, 30), &AttachmentLimits::default())
            .unwrap();
        assert_eq!((preview.width, preview.height), (40, 30));
    }

    #[test]
    fn test_quality_changes_output_size() {
        let limits = |q| AttachmentLimits {
            jpeg_quality: q,
            ..Default::default()
        };
        // Noisy content so quality matters
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([
                (x * 37 % 255) as u8,
                (y * 91 % 255) as u8,
                ((x ^ y) * 13 % 255) as u8,
                255,
            ]);
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let file = ImageFile::new("noise.png", "image/png", bytes);

        let low = RasterImageProcessor.prepare_preview(&file, &limits(10)).unwrap();
        let high = RasterImageProcessor.prepare_preview(&file, &limits(95)).unwrap();
        assert!(jpeg_bytes(&low).len() < jpeg_bytes(&high).len());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let file = ImageFile::new("fake.png", "image/png", b"not an image".to_vec());
        let err = RasterImageProcessor
            .prepare_preview(&file, &AttachmentLimits::default())
            .unwrap_err();
        assert!(matches!(err, ImageProcessingError::Decode(_)));
    }
}
