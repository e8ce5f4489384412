//! EXIF orientation handling.
//!
//! Cameras store pixels in sensor order and record how the image should be
//! displayed in tag 0x0112. Values 1-8 follow the TIFF specification.

use std::io::Cursor;

use image::DynamicImage;

/// A single pixel-space transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    FlipHorizontal,
    FlipVertical,
    /// Clockwise.
    Rotate90,
    Rotate180,
    /// Clockwise (90° counter-clockwise).
    Rotate270,
}

use Transform::*;

/// Transforms for each orientation value, applied in order. Index 0 is unused.
const TRANSFORMS: [&[Transform]; 9] = [
    &[],
    &[],
    &[FlipHorizontal],
    &[Rotate180],
    &[FlipVertical],
    &[FlipHorizontal, Rotate270],
    &[Rotate90],
    &[FlipHorizontal, Rotate90],
    &[Rotate270],
];

/// Transforms that bring an image with the given orientation upright.
///
/// Unknown values (0, >8) are treated as already upright.
pub fn transforms_for(orientation: u32) -> &'static [Transform] {
    TRANSFORMS
        .get(orientation as usize)
        .copied()
        .unwrap_or(&[])
}

/// Read the orientation tag from encoded image bytes.
///
/// Any failure (no EXIF block, malformed EXIF, missing tag) yields 1.
pub fn read_orientation(bytes: &[u8]) -> u32 {
    let Ok(exif) = exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) else {
        return 1;
    };
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .filter(|v| (1..=8).contains(v))
        .unwrap_or(1)
}

/// Apply the transforms for `orientation` to `img`.
pub fn apply(img: DynamicImage, orientation: u32) -> DynamicImage {
    transforms_for(orientation)
        .iter()
        .fold(img, |img, transform| match transform {
            FlipHorizontal => img.fliph(),
            FlipVertical => img.flipv(),
            Rotate90 => img.rotate90(),
            Rotate180 => img.rotate180(),
            Rotate270 => img.rotate270(),
        })
}
