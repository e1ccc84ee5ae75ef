use std::{io::Write, path::Path};

use rusqlite::{OptionalExtension, params};
use tempfile::{Builder, NamedTempFile};

use crate::{
    domain::asset::{AssetId, AssetKind, AssetRecord, NewAsset},
    storage::{
        db::{self, Database},
        error::StorageError,
        schema::{columns::*, tables},
    },
};

/// Keyed blob storage for one asset kind. Two logical instances exist,
/// one per kind, both reading through the same [`Database`].
pub struct AssetStore<'a> {
    db: &'a Database,
    kind: AssetKind,
}

impl<'a> AssetStore<'a> {
    pub(crate) fn new(db: &'a Database, kind: AssetKind) -> Self {
        Self { db, kind }
    }

    fn table(&self) -> &'static str {
        match self.kind {
            AssetKind::Audio => tables::AUDIO_ASSETS,
            AssetKind::Image => tables::IMAGE_ASSETS,
        }
    }

    fn check(&self, asset: &NewAsset) -> Result<(), StorageError> {
        if !self
            .kind
            .allowed_mime_types()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&asset.mime_type))
        {
            return Err(StorageError::InvalidAsset(format!(
                "unsupported {} MIME type: {}",
                self.kind, asset.mime_type
            )));
        }
        if asset.byte_size > self.kind.max_byte_size() {
            return Err(StorageError::InvalidAsset(format!(
                "{} of {} bytes exceeds the {} byte limit for {} assets",
                asset.file_name,
                asset.byte_size,
                self.kind.max_byte_size(),
                self.kind
            )));
        }
        if asset.byte_size != asset.payload.len() as u64 {
            return Err(StorageError::InvalidAsset(format!(
                "declared size {} does not match payload length {}",
                asset.byte_size,
                asset.payload.len()
            )));
        }
        Ok(())
    }

    /// Validates and inserts; the store assigns the id and the
    /// `created_at` stamp.
    pub fn add(&self, asset: &NewAsset) -> Result<AssetId, StorageError> {
        self.check(asset)?;
        let created_at = db::now_secs()?;

        self.db.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} ({FILE_NAME}, {MIME_TYPE}, {BYTE_SIZE}, {PAYLOAD}, {CREATED_AT})
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    self.table()
                ),
                params![
                    asset.file_name,
                    asset.mime_type,
                    asset.byte_size,
                    asset.payload,
                    created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get(&self, id: AssetId) -> Result<AssetRecord, StorageError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {ID}, {FILE_NAME}, {MIME_TYPE}, {BYTE_SIZE}, {PAYLOAD}, {CREATED_AT}
                     FROM {} WHERE {ID} = ?1",
                    self.table()
                ),
                params![id],
                |row| {
                    Ok(AssetRecord {
                        id: row.get(0)?,
                        file_name: row.get(1)?,
                        mime_type: row.get(2)?,
                        byte_size: row.get(3)?,
                        payload: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::AssetNotFound {
                kind: self.kind,
                id,
            })
        })
    }

    /// Materializes the payload into a transient on-disk handle, the
    /// local analogue of an object URL. Rebuilt on every call; it has no
    /// persisted identity and is gone once the handle is dropped.
    pub fn to_url(&self, id: AssetId) -> Result<AssetUrl, StorageError> {
        let record = self.get(id)?;
        AssetUrl::materialize(&record)
    }

    /// Overwrites payload and metadata in place, keeping the id and
    /// re-stamping `created_at`.
    pub fn replace(&self, id: AssetId, asset: &NewAsset) -> Result<(), StorageError> {
        self.check(asset)?;
        let created_at = db::now_secs()?;

        self.db.with_conn(|conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE {} SET {FILE_NAME} = ?1, {MIME_TYPE} = ?2, {BYTE_SIZE} = ?3,
                     {PAYLOAD} = ?4, {CREATED_AT} = ?5 WHERE {ID} = ?6",
                    self.table()
                ),
                params![
                    asset.file_name,
                    asset.mime_type,
                    asset.byte_size,
                    asset.payload,
                    created_at,
                    id
                ],
            )?;
            if changed == 0 {
                return Err(StorageError::AssetNotFound {
                    kind: self.kind,
                    id,
                });
            }
            Ok(())
        })
    }

    /// Idempotent; deleting an absent id is not an error.
    pub fn delete(&self, id: AssetId) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                &format!("DELETE FROM {} WHERE {ID} = ?1", self.table()),
                params![id],
            )?;
            Ok(())
        })
    }
}

/// Scoped handle to a stored payload written out to a temp file. The
/// backing file is removed when the handle is dropped (or via
/// [`AssetUrl::release`]); callers that need the bytes longer must copy
/// them while the handle lives.
#[derive(Debug)]
pub struct AssetUrl {
    file: NamedTempFile,
}

impl AssetUrl {
    fn materialize(record: &AssetRecord) -> Result<Self, StorageError> {
        let suffix = extension_for(&record.mime_type)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut file = Builder::new()
            .prefix("trackdock-asset-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&record.payload)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Removes the backing file now instead of at drop.
    pub fn release(self) -> Result<(), StorageError> {
        self.file.close()?;
        Ok(())
    }
}

fn extension_for(mime: &str) -> Option<&'static str> {
    mime_guess::get_mime_extensions_str(mime).and_then(|exts| exts.first().copied())
}
