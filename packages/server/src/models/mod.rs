pub mod place;
pub mod shared;
