//! Bot configuration: secrets come from the environment (optionally via `.env`),
//! behaviour comes from a JSON settings file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Settings file used when `JUKEBOX_SETTINGS` is not set.
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One cell of the controller grid: either `"skip"` or `{"stop": "red"}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GridEntry {
    Plain(String),
    Colored(BTreeMap<String, String>),
}

impl GridEntry {
    /// The control identifier and optional color name of this cell.
    pub fn parts(&self) -> (Option<&str>, Option<&str>) {
        match self {
            GridEntry::Plain(id) => (Some(id.as_str()), None),
            GridEntry::Colored(map) => match map.iter().next() {
                Some((id, color)) => (Some(id.as_str()), Some(color.as_str())),
                None => (None, None),
            },
        }
    }
}

impl From<&str> for GridEntry {
    fn from(id: &str) -> Self {
        GridEntry::Plain(id.to_string())
    }
}

/// Rows of control identifiers, top to bottom.
pub type ControllerGrid = Vec<Vec<GridEntry>>;

/// Per-user interaction budget for the controller.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CooldownSettings {
    /// Interactions allowed per window.
    pub rate: u32,
    /// Window length in seconds.
    pub per_secs: u64,
}

impl CooldownSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.per_secs)
    }
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            rate: 2,
            per_secs: 10,
        }
    }
}

/// Behavioural settings loaded from the settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub controller: ControllerGrid,
    pub default_volume: u8,
    pub cooldown: CooldownSettings,
    /// Users that bypass the interaction check and every vote.
    pub bot_access_user: Vec<u64>,
    /// Role whose members are treated as DJs.
    pub dj_role: Option<u64>,
    /// When set, every vote passes with the first ballot.
    pub vote_disable: bool,
    /// Optional JSON object of message template overrides.
    pub language_file: Option<PathBuf>,
    /// Market used for artist top tracks.
    pub market: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            controller: vec![
                vec![
                    "back".into(),
                    "resume".into(),
                    "skip".into(),
                    GridEntry::Colored(BTreeMap::from([("stop".to_string(), "red".to_string())])),
                    "loop".into(),
                ],
                vec!["volumedown".into(), "volumemute".into(), "volumeup".into()],
                vec!["tracks".into()],
            ],
            default_volume: 100,
            cooldown: CooldownSettings::default(),
            bot_access_user: Vec::new(),
            dj_role: None,
            vote_disable: false,
            language_file: None,
            market: "US".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        debug!("Loading settings from {:?}", path);
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_bot_access_user(&self, user_id: u64) -> bool {
        self.bot_access_user.contains(&user_id)
    }
}

/// Secrets and file locations taken from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub settings_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let discord_token =
            env::var("DISCORD_TOKEN").map_err(|_| ConfigError::MissingEnv("DISCORD_TOKEN"))?;

        Ok(Self {
            discord_token,
            spotify_client_id: env::var("SPOTIFY_CLIENT_ID").ok(),
            spotify_client_secret: env::var("SPOTIFY_CLIENT_SECRET").ok(),
            settings_path: env::var("JUKEBOX_SETTINGS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH)),
        })
    }
}
