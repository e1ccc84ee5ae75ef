use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "failed to parse config TOML")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub in_memory: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Database {
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            path: None,
        }
    }
}
