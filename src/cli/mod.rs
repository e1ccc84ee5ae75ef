use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config;
use crate::domain::asset::NewAsset;
use crate::domain::track::Track;
use crate::storage::db::i64_seconds_to_local_time;
use crate::storage::{Storage, query};

#[derive(Parser)]
#[command(name = "trackdock")]
#[command(version = "0.1")]
#[command(about = "Local media track catalog")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "trackdock.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a track, optionally attaching audio and cover image files
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        /// One of: Pop, Rock, Jazz, Classical, Chaabi
        #[arg(long)]
        category: String,
        /// Duration in seconds
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
        #[arg(long)]
        description: Option<String>,
        /// Audio file to store alongside the track
        #[arg(long)]
        audio: Option<PathBuf>,
        /// Cover image to store alongside the track
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit an existing track, optionally replacing its audio or image
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        /// Replacement audio file
        #[arg(long)]
        audio: Option<PathBuf>,
        /// Replacement cover image
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List tracks in insertion order
    List {
        /// Only tracks in this category
        #[arg(long)]
        category: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one track with its asset metadata and neighbors
    Show { id: i64 },
    /// Delete a track and its linked assets
    Delete { id: i64 },
    /// Search titles and artists
    Search { query: String },
    /// Copy a stored asset out to a file
    Export {
        kind: AssetArg,
        id: i64,
        dest: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AssetArg {
    Audio,
    Image,
}

fn read_asset(path: &Path) -> anyhow::Result<NewAsset> {
    let payload = std::fs::read(path)?;
    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(NewAsset::from_bytes(file_name, mime, payload))
}

fn print_track(track: &Track) {
    let id = track.id.unwrap_or_default();
    println!("[{id}] {} - {} ({})", track.artist, track.title, track.category);
    if let Some(description) = &track.description {
        println!("    {description}");
    }
    println!("    duration: {:.0}s", track.duration_secs);
    if let Ok(created) = i64_seconds_to_local_time(track.created_at) {
        println!("    created: {created}");
    }
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = config::Config::load(&cli.config).unwrap();
    let storage = Storage::new(cfg.database);
    storage.ensure_ready().expect("Failed to open the catalog database");

    match &cli.command {
        Commands::Add {
            title,
            artist,
            category,
            duration,
            description,
            audio,
            image,
        } => {
            let audio = audio.as_deref().map(read_asset).transpose().unwrap();
            let image = image.as_deref().map(read_asset).transpose().unwrap();

            let track = Track {
                id: None,
                title: title.clone(),
                artist: artist.clone(),
                description: description.clone(),
                category: category.clone(),
                duration_secs: *duration,
                audio_file_id: None,
                image_file_id: None,
                created_at: 0,
            };

            let id = storage
                .tracks()
                .add_with_assets(&track, audio.as_ref(), image.as_ref())
                .unwrap();
            println!("Added track {id}");
        }

        Commands::Update {
            id,
            title,
            artist,
            category,
            duration,
            description,
            audio,
            image,
        } => {
            let tracks = storage.tracks();
            let mut track = tracks.get_by_id(*id).unwrap();

            if let Some(title) = title {
                track.title = title.clone();
            }
            if let Some(artist) = artist {
                track.artist = artist.clone();
            }
            if let Some(category) = category {
                track.category = category.clone();
            }
            if let Some(duration) = duration {
                track.duration_secs = *duration;
            }
            if let Some(description) = description {
                track.description = Some(description.clone());
            }

            let audio = audio.as_deref().map(read_asset).transpose().unwrap();
            let image = image.as_deref().map(read_asset).transpose().unwrap();

            tracks
                .update(&track, audio.as_ref(), image.as_ref())
                .unwrap();
            println!("Updated track {id}");
        }

        Commands::List { category, json } => {
            let tracks = match category {
                Some(category) => query::find_by_category(&storage.tracks(), category).unwrap(),
                None => storage.tracks().get_all().unwrap(),
            };

            if *json {
                println!("{}", serde_json::to_string_pretty(&tracks).unwrap());
            } else {
                for track in &tracks {
                    print_track(track);
                }
                println!("{} track(s)", tracks.len());
            }
        }

        Commands::Show { id } => {
            let tracks = storage.tracks();
            let track = tracks.get_by_id(*id).unwrap();
            print_track(&track);

            if let Some(asset_id) = track.audio_file_id {
                let asset = storage.audio().get(asset_id).unwrap();
                println!("    audio: {} ({}, {} bytes)", asset.file_name, asset.mime_type, asset.byte_size);
            }
            if let Some(asset_id) = track.image_file_id {
                let asset = storage.images().get(asset_id).unwrap();
                println!("    image: {} ({}, {} bytes)", asset.file_name, asset.mime_type, asset.byte_size);
            }

            if let Some(prev) = query::previous(&tracks, *id).unwrap() {
                println!("    previous: [{}] {}", prev.id.unwrap_or_default(), prev.title);
            }
            if let Some(next) = query::next(&tracks, *id).unwrap() {
                println!("    next: [{}] {}", next.id.unwrap_or_default(), next.title);
            }
        }

        Commands::Delete { id } => {
            storage.tracks().delete(*id).unwrap();
            println!("Deleted track {id} (if it existed)");
        }

        Commands::Search { query: text } => {
            let results = query::search(&storage.tracks(), text).unwrap();
            for track in &results {
                print_track(track);
            }
            println!("{} match(es)", results.len());
        }

        Commands::Export { kind, id, dest } => {
            let url = match kind {
                AssetArg::Audio => storage.audio().to_url(*id).unwrap(),
                AssetArg::Image => storage.images().to_url(*id).unwrap(),
            };
            std::fs::copy(url.path(), dest).unwrap();
            url.release().unwrap();
            println!("Exported asset {id} to {}", dest.display());
        }
    }
}
