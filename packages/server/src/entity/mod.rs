pub mod place;
pub mod place_image;
