use tracing::{error, info};

use crate::entity::{place, place_image};
use crate::store::PlaceError;

/// Receives notable place events from [`PlaceService`](super::PlaceService).
///
/// All methods default to no-ops so implementations only override what they
/// care about.
pub trait PlaceObserver: Send + Sync {
    fn place_created(&self, _place: &place::Model) {}

    fn place_updated(&self, _place: &place::Model, _deleted_images: &[place_image::Model]) {}

    fn place_deleted(&self, _place: &place::Model, _image_count: usize) {}

    fn images_uploaded(&self, _place: &place::Model, _images: &[place_image::Model]) {}

    fn images_reordered(&self, _place: &place::Model, _image_ids: &[i32]) {}

    fn image_deleted(&self, _place: &place::Model, _image: &place_image::Model) {}

    /// An operation failed for a reason other than bad input.
    fn operation_failed(&self, _operation: &'static str, _error: &PlaceError) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PlaceObserver for TracingObserver {
    fn place_created(&self, place: &place::Model) {
        info!(id = place.id, slug = %place.slug, "Place created");
    }

    fn place_updated(&self, place: &place::Model, deleted_images: &[place_image::Model]) {
        info!(
            id = place.id,
            slug = %place.slug,
            deleted_images = deleted_images.len(),
            "Place updated"
        );
    }

    fn place_deleted(&self, place: &place::Model, image_count: usize) {
        info!(id = place.id, slug = %place.slug, image_count, "Place deleted");
    }

    fn images_uploaded(&self, place: &place::Model, images: &[place_image::Model]) {
        let bytes: i64 = images.iter().map(|i| i.size).sum();
        info!(
            place_id = place.id,
            count = images.len(),
            bytes,
            "Images uploaded"
        );
    }

    fn images_reordered(&self, place: &place::Model, image_ids: &[i32]) {
        info!(place_id = place.id, ?image_ids, "Images reordered");
    }

    fn image_deleted(&self, place: &place::Model, image: &place_image::Model) {
        info!(place_id = place.id, image_id = image.id, "Image deleted");
    }

    fn operation_failed(&self, operation: &'static str, err: &PlaceError) {
        error!(operation, error = %err, "Place operation failed");
    }
}
