//! Place orchestration: defaults, id-list resolution, presentation, and
//! event reporting on top of the record store.

mod observer;
mod place;

pub use observer::{PlaceObserver, TracingObserver};
pub use place::{DEFAULT_NAME, PlaceService};
