pub mod storage;

pub use storage::{FileStorage, StorageError, StorageKey};
