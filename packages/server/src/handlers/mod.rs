pub mod media;
pub mod place;
