use common::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

use crate::imaging::ImagingError;

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("image processing failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("{0}")]
    Internal(String),
}

impl PlaceError {
    /// Whether the failure is the caller's fault rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }
}
