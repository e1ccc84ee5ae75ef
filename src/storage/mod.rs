pub mod assets;
pub mod db;
pub mod error;
pub mod query;
pub(crate) mod schema;
pub mod tracks;

use crate::{
    config,
    domain::asset::AssetKind,
    storage::{assets::AssetStore, db::Database, error::StorageError, tracks::TrackStore},
};

/// The storage context handed to everything that persists data. Owns
/// the lazily opened database; never a global.
pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn new(config: config::Database) -> Self {
        Self {
            db: Database::new(config),
        }
    }

    /// Opens the database eagerly. Optional; every accessor below opens
    /// lazily on first use.
    pub fn ensure_ready(&self) -> Result<(), StorageError> {
        self.db.open()
    }

    pub fn tracks(&self) -> TrackStore<'_> {
        TrackStore::new(&self.db)
    }

    pub fn audio(&self) -> AssetStore<'_> {
        AssetStore::new(&self.db, AssetKind::Audio)
    }

    pub fn images(&self) -> AssetStore<'_> {
        AssetStore::new(&self.db, AssetKind::Image)
    }
}
