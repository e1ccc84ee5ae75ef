//! Full-scan filtering and positional navigation over the track store.
//!
//! Everything here is O(n) per call on purpose: the catalog is a
//! personal library, and re-fetching the whole list keeps the ordering
//! contract trivially in sync with [`TrackStore::get_all`].

use crate::{
    domain::track::{Track, TrackId},
    storage::{error::StorageError, tracks::TrackStore},
};

/// Case-insensitive exact match on category.
pub fn find_by_category(tracks: &TrackStore, category: &str) -> Result<Vec<Track>, StorageError> {
    Ok(tracks
        .get_all()?
        .into_iter()
        .filter(|t| t.category.eq_ignore_ascii_case(category))
        .collect())
}

/// Case-insensitive substring match on title or artist. A blank query
/// returns the full list, so list views can reset without a special
/// case.
pub fn search(tracks: &TrackStore, query: &str) -> Result<Vec<Track>, StorageError> {
    let needle = query.trim().to_lowercase();
    let all = tracks.get_all()?;
    if needle.is_empty() {
        return Ok(all);
    }
    Ok(all
        .into_iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle) || t.artist.to_lowercase().contains(&needle)
        })
        .collect())
}

/// The record after `current` in insertion order, `None` past the end
/// or when `current` is unknown.
pub fn next(tracks: &TrackStore, current: TrackId) -> Result<Option<Track>, StorageError> {
    let all = tracks.get_all()?;
    let Some(pos) = all.iter().position(|t| t.id == Some(current)) else {
        return Ok(None);
    };
    Ok(all.into_iter().nth(pos + 1))
}

/// The record before `current`, `None` at the start or when `current`
/// is unknown.
pub fn previous(tracks: &TrackStore, current: TrackId) -> Result<Option<Track>, StorageError> {
    let all = tracks.get_all()?;
    let Some(pos) = all.iter().position(|t| t.id == Some(current)) else {
        return Ok(None);
    };
    if pos == 0 {
        return Ok(None);
    }
    Ok(all.into_iter().nth(pos - 1))
}
