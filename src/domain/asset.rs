use std::fmt::{self, Display};

use crate::storage::db::SecondsSinceUnix;

pub type AssetId = i64;

const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/ogg",
    "audio/flac",
    "audio/aac",
    "audio/mp4",
];

const IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

const AUDIO_MAX_BYTES: u64 = 15 * 1024 * 1024;
const IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Which of the two blob stores an asset lives in. The kind fixes the
/// MIME allow-list and the size cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Audio,
    Image,
}

impl AssetKind {
    pub fn allowed_mime_types(self) -> &'static [&'static str] {
        match self {
            AssetKind::Audio => AUDIO_MIME_TYPES,
            AssetKind::Image => IMAGE_MIME_TYPES,
        }
    }

    pub fn max_byte_size(self) -> u64 {
        match self {
            AssetKind::Audio => AUDIO_MAX_BYTES,
            AssetKind::Image => IMAGE_MAX_BYTES,
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Audio => write!(f, "audio"),
            AssetKind::Image => write!(f, "image"),
        }
    }
}

/// A stored blob row. The payload is owned by the store entry; tracks
/// only hold the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: AssetId,
    pub file_name: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub payload: Vec<u8>,
    pub created_at: SecondsSinceUnix,
}

/// Write-side description of a blob, before the store assigns an id.
/// `byte_size` is declared by the caller and checked against the payload
/// at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub file_name: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub payload: Vec<u8>,
}

impl NewAsset {
    pub fn from_bytes(file_name: impl Into<String>, mime_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            byte_size: payload.len() as u64,
            payload,
        }
    }
}
