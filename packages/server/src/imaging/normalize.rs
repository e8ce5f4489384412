use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

use super::{calculations, orientation};

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Could not encode image: {0}")]
    Encode(String),
}

/// Bounds and encoder settings for normalized uploads.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1-100. Other formats ignore it.
    pub quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 800,
            quality: 85,
        }
    }
}

/// Re-encoded image ready to be stored.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Upright, bounded re-encoding of uploaded images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer {
    options: NormalizeOptions,
}

impl ImageNormalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Normalize an uploaded image.
    ///
    /// `None` in gives `None` out. Otherwise the image is decoded, turned
    /// upright according to its EXIF orientation, downscaled with Lanczos3 if
    /// it exceeds the configured bounds, and re-encoded in its source format.
    /// Images already within bounds are re-encoded without resampling.
    /// The filename's extension is only consulted when the bytes themselves do
    /// not identify the format; if neither does, the output is JPEG.
    pub fn normalize(
        &self,
        raw: Option<&[u8]>,
        filename: &str,
    ) -> Result<Option<NormalizedImage>, ImagingError> {
        let Some(raw) = raw else {
            return Ok(None);
        };

        let source_format = image::guess_format(raw)
            .ok()
            .or_else(|| ImageFormat::from_path(Path::new(filename)).ok());

        let decoded = match source_format {
            Some(format) => image::load_from_memory_with_format(raw, format),
            None => image::load_from_memory(raw),
        }
        .map_err(|e| ImagingError::Decode(e.to_string()))?;

        let upright = orientation::apply(decoded, orientation::read_orientation(raw));

        let bounds = (self.options.max_width, self.options.max_height);
        let resized = if calculations::exceeds(upright.dimensions(), bounds) {
            let (w, h) = calculations::fit_within(upright.dimensions(), bounds);
            upright.resize_exact(w, h, FilterType::Lanczos3)
        } else {
            upright
        };

        let format = output_format(source_format);
        let bytes = encode(&resized, format, self.options.quality)?;
        let (width, height) = resized.dimensions();

        tracing::debug!(
            filename,
            ?format,
            width,
            height,
            input_bytes = raw.len(),
            output_bytes = bytes.len(),
            "Normalized image"
        );

        Ok(Some(NormalizedImage {
            bytes,
            format,
            width,
            height,
        }))
    }
}

fn output_format(source: Option<ImageFormat>) -> ImageFormat {
    match source {
        Some(f @ (ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP)) => f,
        _ => ImageFormat::Jpeg,
    }
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::Png => img.write_to(&mut Cursor::new(&mut buf), format),
        // The GIF and WebP encoders only accept 8-bit RGBA.
        _ => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut Cursor::new(&mut buf), format),
    };
    result.map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(buf)
}
