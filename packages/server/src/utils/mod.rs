pub mod dates;
pub mod filename;
pub mod slug;
