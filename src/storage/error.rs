use thiserror::Error;

use crate::domain::{
    asset::{AssetId, AssetKind},
    track::TrackId,
};

#[derive(Debug, Error)]
pub enum StorageError {
    /// Opening the database failed. Fatal for every operation until a
    /// later open succeeds; never retried automatically.
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("{kind} asset {id} not found")]
    AssetNotFound { kind: AssetKind, id: AssetId },

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("track has no id")]
    MissingId,

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
