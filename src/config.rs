use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::constants::{ANIMATION_INTERVAL, DEFAULT_CONTACT_ENDPOINT, DEFAULT_SLOTS};

#[derive(Debug, Parser)]
#[command(name = "ringlight", version, about = "Neon ring-light loop for the landing page")]
pub struct Args {
    /// Pause between two slot activations, in milliseconds
    #[arg(long, env = "RINGLIGHT_INTERVAL_MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Slot ids in lighting order, comma separated
    #[arg(long, env = "RINGLIGHT_SLOTS", value_delimiter = ',')]
    pub slots: Option<Vec<String>>,

    /// Stop the animation after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// TOML file with `interval_ms`, `slots` and `contact_endpoint`
    #[arg(long, env = "RINGLIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "RINGLIGHT_CONTACT_ENDPOINT")]
    pub contact_endpoint: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long)]
    pub no_color: bool,

    /// Open a window instead of printing to the terminal
    #[cfg(feature = "window")]
    #[arg(long)]
    pub window: bool,

    /// Also write the rendered frames to this video file (needs ffmpeg on PATH)
    #[cfg(feature = "window")]
    #[arg(long, requires = "window")]
    pub record: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingFile {
    pub interval_ms: Option<u64>,
    pub slots: Option<Vec<String>>,
    pub contact_endpoint: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("interval_ms must be at least 1")]
    ZeroInterval,
    #[error("slot ids must not be blank")]
    BlankSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub slots: Vec<String>,
    pub interval: Duration,
    pub contact_endpoint: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS.iter().map(|id| id.to_string()).collect(),
            interval: ANIMATION_INTERVAL,
            contact_endpoint: DEFAULT_CONTACT_ENDPOINT.to_string(),
        }
    }
}

pub fn load_ring_file(path: &Path) -> Result<RingFile, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Defaults, then the config file, then command line flags.
pub fn resolve(args: &Args) -> Result<PageConfig, ConfigError> {
    let file = match &args.config {
        Some(path) => load_ring_file(path)?,
        None => RingFile::default(),
    };
    merge(file, args)
}

fn merge(file: RingFile, args: &Args) -> Result<PageConfig, ConfigError> {
    let mut config = PageConfig::default();

    if let Some(ms) = args.interval_ms.or(file.interval_ms) {
        if ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        config.interval = Duration::from_millis(ms);
    }
    if let Some(slots) = args.slots.clone().or(file.slots) {
        let slots: Vec<String> = slots.into_iter().map(|id| id.trim().to_string()).collect();
        if slots.iter().any(String::is_empty) {
            return Err(ConfigError::BlankSlot);
        }
        config.slots = slots;
    }
    if let Some(endpoint) = args.contact_endpoint.clone().or(file.contact_endpoint) {
        config.contact_endpoint = endpoint;
    }
    Ok(config)
}
