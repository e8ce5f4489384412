//! Image ingestion: orientation correction and bounded downscaling.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Detect format** | `image::guess_format`, falling back to the file extension |
//! | **Orientation** | `kamadak-exif` reads tag 0x0112, [`orientation`] maps it to transforms |
//! | **Resize** | `image::imageops` `Lanczos3`, bounds from [`calculations`] |
//! | **Encode** | source format; JPEG at the configured quality |
//!
//! Everything here is synchronous and CPU-bound. Callers on an async runtime
//! should run [`ImageNormalizer::normalize`] on a blocking thread.

pub mod calculations;
mod normalize;
pub mod orientation;

pub use normalize::{ImageNormalizer, ImagingError, NormalizeOptions, NormalizedImage};
