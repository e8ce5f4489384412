mod common;
mod images;
mod places;
