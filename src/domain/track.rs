use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::{domain::asset::AssetId, storage::db::SecondsSinceUnix};

pub type TrackId = i64;

pub const TITLE_MAX_CHARS: usize = 50;
pub const ARTIST_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// A catalog entry for one piece of music.
///
/// `audio_file_id` and `image_file_id` are weak references into the asset
/// stores: plain ids with no database-level foreign key. Keeping them in
/// sync (validate before write, cascade on delete) is the repository's
/// job, best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<TrackId>,
    pub title: String,
    pub artist: String,
    pub description: Option<String>,
    pub category: String,
    pub duration_secs: f64,
    pub audio_file_id: Option<AssetId>,
    pub image_file_id: Option<AssetId>,
    /// Seconds since unix epoch. The store overwrites this on every
    /// insert *and* update, matching the original catalog's behavior.
    pub created_at: SecondsSinceUnix,
}

/// Closed set of track categories. Stored as text but parsed through
/// here at write time, so anything outside the list never reaches disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pop,
    Rock,
    Jazz,
    Classical,
    Chaabi,
}

impl Category {
    pub const ALL: &[Category] = &[
        Category::Pop,
        Category::Rock,
        Category::Jazz,
        Category::Classical,
        Category::Chaabi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pop => "Pop",
            Category::Rock => "Rock",
            Category::Jazz => "Jazz",
            Category::Classical => "Classical",
            Category::Chaabi => "Chaabi",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| anyhow!("unknown category: {s}"))
    }
}
