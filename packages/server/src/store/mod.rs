//! Persistence for places and their image galleries.

mod error;
mod place;

pub use error::PlaceError;
pub use place::{NewPlace, PlaceChanges, PlaceStore, RawImage};
