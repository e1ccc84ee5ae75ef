use rusqlite::{OptionalExtension, Row, params};

use crate::{
    domain::{
        asset::{AssetKind, NewAsset},
        track::{
            ARTIST_MAX_CHARS, Category, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, Track, TrackId,
        },
    },
    storage::{
        assets::AssetStore,
        db::{self, Database},
        error::StorageError,
        schema::{
            columns::*,
            tables::{AUDIO_ASSETS, IMAGE_ASSETS, TRACKS},
        },
    },
};

/// Keyed storage of track metadata plus the compound operations that
/// keep the weak audio/image links consistent.
pub struct TrackStore<'a> {
    db: &'a Database,
}

/// Enforces the data-model rules. First failing rule wins; reasons are
/// meant for end users, not logs.
pub fn validate(track: &Track) -> Result<(), StorageError> {
    let fail = |reason: String| Err(StorageError::Validation(reason));

    if track.title.trim().is_empty() {
        return fail("title is required".into());
    }
    if track.title.chars().count() > TITLE_MAX_CHARS {
        return fail(format!("title is longer than {TITLE_MAX_CHARS} characters"));
    }
    if track.artist.trim().is_empty() {
        return fail("artist is required".into());
    }
    if track.artist.chars().count() > ARTIST_MAX_CHARS {
        return fail(format!("artist is longer than {ARTIST_MAX_CHARS} characters"));
    }
    if let Some(description) = &track.description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return fail(format!(
                "description is longer than {DESCRIPTION_MAX_CHARS} characters"
            ));
        }
    }
    if track.category.parse::<Category>().is_err() {
        return fail(format!("unknown category: {}", track.category));
    }
    if track.duration_secs < 0.0 {
        return fail("duration must be non-negative".into());
    }
    Ok(())
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        artist: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        duration_secs: row.get(5)?,
        audio_file_id: row.get(6)?,
        image_file_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const TRACK_COLUMNS: &str = "id, title, artist, description, category, duration_secs, audio_file_id, image_file_id, created_at";

impl<'a> TrackStore<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Full scan in surrogate-key order, i.e. insertion order.
    pub fn get_all(&self) -> Result<Vec<Track>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRACK_COLUMNS} FROM {TRACKS} ORDER BY {ID} ASC"
            ))?;
            let tracks = stmt
                .query_map([], track_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tracks)
        })
    }

    pub fn get_by_id(&self, id: TrackId) -> Result<Track, StorageError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TRACK_COLUMNS} FROM {TRACKS} WHERE {ID} = ?1"),
                params![id],
                track_from_row,
            )
            .optional()?
            .ok_or(StorageError::TrackNotFound(id))
        })
    }

    /// Validates, then inserts with a fresh id and a now `created_at`.
    /// An invalid track never touches storage.
    pub fn add(&self, track: &Track) -> Result<TrackId, StorageError> {
        validate(track)?;
        let created_at = db::now_secs()?;

        self.db.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {TRACKS}
                     ({TITLE}, {ARTIST}, {DESCRIPTION}, {CATEGORY}, {DURATION_SECS},
                      {AUDIO_FILE_ID}, {IMAGE_FILE_ID}, {CREATED_AT})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    track.title,
                    track.artist,
                    track.description,
                    track.category,
                    track.duration_secs,
                    track.audio_file_id,
                    track.image_file_id,
                    created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Inserts the given blobs, stitches the assigned ids into the
    /// track, then inserts the track. A failing blob insert aborts
    /// before the track write; blobs inserted by earlier steps are left
    /// behind (no cross-store rollback).
    pub fn add_with_assets(
        &self,
        track: &Track,
        audio: Option<&NewAsset>,
        image: Option<&NewAsset>,
    ) -> Result<TrackId, StorageError> {
        let mut track = track.clone();
        if let Some(audio) = audio {
            let id = AssetStore::new(self.db, AssetKind::Audio).add(audio)?;
            track.audio_file_id = Some(id);
        }
        if let Some(image) = image {
            let id = AssetStore::new(self.db, AssetKind::Image).add(image)?;
            track.image_file_id = Some(id);
        }
        self.add(&track)
    }

    /// Overwrites the record at `track.id`. A new audio/image spec
    /// replaces the currently linked blob in place when a link exists,
    /// otherwise a fresh blob is inserted and linked. `created_at` is
    /// re-stamped to now, the same way the original catalog did it.
    pub fn update(
        &self,
        track: &Track,
        new_audio: Option<&NewAsset>,
        new_image: Option<&NewAsset>,
    ) -> Result<TrackId, StorageError> {
        let id = track.id.ok_or(StorageError::MissingId)?;
        let existing = self.get_by_id(id)?;
        validate(track)?;

        let mut track = track.clone();
        if let Some(spec) = new_audio {
            let store = AssetStore::new(self.db, AssetKind::Audio);
            match existing.audio_file_id {
                Some(asset_id) => {
                    store.replace(asset_id, spec)?;
                    track.audio_file_id = Some(asset_id);
                }
                None => track.audio_file_id = Some(store.add(spec)?),
            }
        } else if track.audio_file_id.is_none() {
            track.audio_file_id = existing.audio_file_id;
        }
        if let Some(spec) = new_image {
            let store = AssetStore::new(self.db, AssetKind::Image);
            match existing.image_file_id {
                Some(asset_id) => {
                    store.replace(asset_id, spec)?;
                    track.image_file_id = Some(asset_id);
                }
                None => track.image_file_id = Some(store.add(spec)?),
            }
        } else if track.image_file_id.is_none() {
            track.image_file_id = existing.image_file_id;
        }

        let created_at = db::now_secs()?;
        self.db.with_conn(|conn| {
            conn.execute(
                &format!(
                    "UPDATE {TRACKS} SET {TITLE} = ?1, {ARTIST} = ?2, {DESCRIPTION} = ?3,
                     {CATEGORY} = ?4, {DURATION_SECS} = ?5, {AUDIO_FILE_ID} = ?6,
                     {IMAGE_FILE_ID} = ?7, {CREATED_AT} = ?8
                     WHERE {ID} = ?9"
                ),
                params![
                    track.title,
                    track.artist,
                    track.description,
                    track.category,
                    track.duration_secs,
                    track.audio_file_id,
                    track.image_file_id,
                    created_at,
                    id
                ],
            )?;
            Ok(id)
        })
    }

    /// Cascade delete: linked audio and image assets go first, then the
    /// track row. A no-op when the id does not exist.
    pub fn delete(&self, id: TrackId) -> Result<(), StorageError> {
        let track = match self.get_by_id(id) {
            Ok(track) => track,
            Err(StorageError::TrackNotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        self.db.with_conn(|conn| {
            if let Some(asset_id) = track.audio_file_id {
                conn.execute(
                    &format!("DELETE FROM {AUDIO_ASSETS} WHERE {ID} = ?1"),
                    params![asset_id],
                )?;
            }
            if let Some(asset_id) = track.image_file_id {
                conn.execute(
                    &format!("DELETE FROM {IMAGE_ASSETS} WHERE {ID} = ?1"),
                    params![asset_id],
                )?;
            }
            conn.execute(
                &format!("DELETE FROM {TRACKS} WHERE {ID} = ?1"),
                params![id],
            )?;
            Ok(())
        })?;
        log::info!("deleted track {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config, domain::asset::NewAsset};

    fn test_db() -> Database {
        Database::new(config::Database::in_memory())
    }

    fn sample_track(title: &str) -> Track {
        Track {
            id: None,
            title: title.to_string(),
            artist: "Artist".to_string(),
            description: None,
            category: "Pop".to_string(),
            duration_secs: 180.0,
            audio_file_id: None,
            image_file_id: None,
            created_at: 0,
        }
    }

    fn mp3(payload: Vec<u8>) -> NewAsset {
        NewAsset::from_bytes("song.mp3", "audio/mpeg", payload)
    }

    fn png(payload: Vec<u8>) -> NewAsset {
        NewAsset::from_bytes("cover.png", "image/png", payload)
    }

    #[test]
    fn add_then_get_by_id_roundtrips() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let mut track = sample_track("Blue Moon");
        track.description = Some("standard".to_string());
        let id = store.add(&track).unwrap();

        let stored = store.get_by_id(id).unwrap();
        assert_eq!(stored.id, Some(id));
        assert!(stored.created_at > 0);

        // equal apart from the assigned id and timestamp
        let mut expected = track.clone();
        expected.id = stored.id;
        expected.created_at = stored.created_at;
        assert_eq!(stored, expected);
    }

    #[test]
    fn get_by_id_missing_is_not_found() {
        let db = test_db();
        let store = TrackStore::new(&db);

        assert!(matches!(
            store.get_by_id(7),
            Err(StorageError::TrackNotFound(7))
        ));
    }

    #[test]
    fn invalid_category_fails_without_writing() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let mut track = sample_track("t");
        track.category = "Metal".to_string();

        let err = store.add(&track).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn description_length_boundary() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let mut track = sample_track("t");
        track.description = Some("a".repeat(200));
        store.add(&track).unwrap();

        track.description = Some("a".repeat(201));
        assert!(matches!(
            store.add(&track),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn title_rules() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let mut track = sample_track("  ");
        assert!(matches!(store.add(&track), Err(StorageError::Validation(_))));

        track.title = "a".repeat(51);
        assert!(matches!(store.add(&track), Err(StorageError::Validation(_))));

        track.title = "a".repeat(50);
        store.add(&track).unwrap();
    }

    #[test]
    fn negative_duration_is_rejected() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let mut track = sample_track("t");
        track.duration_secs = -1.0;
        assert!(matches!(store.add(&track), Err(StorageError::Validation(_))));
    }

    #[test]
    fn duplicate_titles_are_allowed() {
        let db = test_db();
        let store = TrackStore::new(&db);

        store.add(&sample_track("same")).unwrap();
        store.add(&sample_track("same")).unwrap();
        assert_eq!(store.get_all().unwrap().len(), 2);
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let db = test_db();
        let store = TrackStore::new(&db);

        for title in ["first", "second", "third"] {
            store.add(&sample_track(title)).unwrap();
        }

        let titles: Vec<String> = store
            .get_all()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn update_without_id_is_missing_id() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let track = sample_track("t");
        assert!(matches!(
            store.update(&track, None, None),
            Err(StorageError::MissingId)
        ));
    }

    #[test]
    fn update_nonexistent_id_fails_before_any_write() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let mut track = sample_track("t");
        track.id = Some(99);
        assert!(matches!(
            store.update(&track, None, None),
            Err(StorageError::TrackNotFound(99))
        ));
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn update_overwrites_fields() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store.add(&sample_track("before")).unwrap();

        let mut track = store.get_by_id(id).unwrap();
        track.title = "after".to_string();
        track.category = "Jazz".to_string();
        let returned = store.update(&track, None, None).unwrap();
        assert_eq!(returned, id);

        let stored = store.get_by_id(id).unwrap();
        assert_eq!(stored.title, "after");
        assert_eq!(stored.category, "Jazz");
    }

    #[test]
    fn update_restamps_created_at() {
        // Source-compatible quirk: update overwrites created_at with the
        // current time instead of keeping the original insert stamp.
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store.add(&sample_track("t")).unwrap();
        db.with_conn(|conn| {
            conn.execute("UPDATE tracks SET created_at = 5 WHERE id = ?1", params![id])?;
            Ok(())
        })
        .unwrap();

        let track = store.get_by_id(id).unwrap();
        assert_eq!(track.created_at, 5);

        store.update(&track, None, None).unwrap();
        assert!(store.get_by_id(id).unwrap().created_at > 5);
    }

    #[test]
    fn update_replaces_linked_audio_in_place() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store
            .add_with_assets(&sample_track("t"), Some(&mp3(vec![1])), None)
            .unwrap();
        let audio_id = store.get_by_id(id).unwrap().audio_file_id.unwrap();

        let track = store.get_by_id(id).unwrap();
        store.update(&track, Some(&mp3(vec![2, 2])), None).unwrap();

        // same asset id, new payload
        let stored = store.get_by_id(id).unwrap();
        assert_eq!(stored.audio_file_id, Some(audio_id));
        let record = AssetStore::new(&db, AssetKind::Audio).get(audio_id).unwrap();
        assert_eq!(record.payload, vec![2, 2]);
    }

    #[test]
    fn update_attaches_fresh_blob_when_unlinked() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store.add(&sample_track("t")).unwrap();
        let track = store.get_by_id(id).unwrap();
        store.update(&track, None, Some(&png(vec![3]))).unwrap();

        let image_id = store.get_by_id(id).unwrap().image_file_id.unwrap();
        let record = AssetStore::new(&db, AssetKind::Image).get(image_id).unwrap();
        assert_eq!(record.payload, vec![3]);
    }

    #[test]
    fn update_keeps_links_when_caller_omits_them() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store
            .add_with_assets(&sample_track("t"), Some(&mp3(vec![1])), Some(&png(vec![2])))
            .unwrap();

        let mut track = store.get_by_id(id).unwrap();
        track.audio_file_id = None;
        track.image_file_id = None;
        track.title = "renamed".to_string();
        store.update(&track, None, None).unwrap();

        let stored = store.get_by_id(id).unwrap();
        assert!(stored.audio_file_id.is_some());
        assert!(stored.image_file_id.is_some());
    }

    #[test]
    fn add_with_assets_links_both_blobs() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store
            .add_with_assets(&sample_track("t"), Some(&mp3(vec![1])), Some(&png(vec![2])))
            .unwrap();

        let stored = store.get_by_id(id).unwrap();
        let audio = AssetStore::new(&db, AssetKind::Audio)
            .get(stored.audio_file_id.unwrap())
            .unwrap();
        let image = AssetStore::new(&db, AssetKind::Image)
            .get(stored.image_file_id.unwrap())
            .unwrap();
        assert_eq!(audio.payload, vec![1]);
        assert_eq!(image.payload, vec![2]);
    }

    #[test]
    fn add_with_assets_leaves_orphan_audio_on_image_failure() {
        // Documented non-atomicity: the audio blob inserted before the
        // failing image step is not rolled back, but no track appears.
        let db = test_db();
        let store = TrackStore::new(&db);

        let bad_image = NewAsset::from_bytes("cover.bmp", "image/bmp", vec![0]);
        let err = store
            .add_with_assets(&sample_track("t"), Some(&mp3(vec![1])), Some(&bad_image))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidAsset(_)));

        assert!(store.get_all().unwrap().is_empty());
        let orphan = AssetStore::new(&db, AssetKind::Audio).get(1).unwrap();
        assert_eq!(orphan.payload, vec![1]);
    }

    #[test]
    fn delete_cascades_to_linked_assets() {
        let db = test_db();
        let store = TrackStore::new(&db);

        let id = store
            .add_with_assets(&sample_track("t"), Some(&mp3(vec![1])), Some(&png(vec![2])))
            .unwrap();
        let stored = store.get_by_id(id).unwrap();
        let audio_id = stored.audio_file_id.unwrap();
        let image_id = stored.image_file_id.unwrap();

        store.delete(id).unwrap();

        assert!(matches!(
            store.get_by_id(id),
            Err(StorageError::TrackNotFound(_))
        ));
        assert!(matches!(
            AssetStore::new(&db, AssetKind::Audio).get(audio_id),
            Err(StorageError::AssetNotFound { .. })
        ));
        assert!(matches!(
            AssetStore::new(&db, AssetKind::Image).get(image_id),
            Err(StorageError::AssetNotFound { .. })
        ));
    }

    #[test]
    fn delete_nonexistent_is_a_noop() {
        let db = test_db();
        let store = TrackStore::new(&db);

        store.add(&sample_track("t")).unwrap();
        store.delete(99).unwrap();
        assert_eq!(store.get_all().unwrap().len(), 1);
    }
}
