//! Message templates used by the controller, with positional `{}` arguments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ConfigError;

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("voted", "You have already voted!"),
    ("backVote", "{} has voted to go back to the previous song! [{}/{}]"),
    ("backed", "{} has gone back to the previous song."),
    ("resumeVote", "{} has voted to resume the player! [{}/{}]"),
    ("pauseVote", "{} has voted to pause the player! [{}/{}]"),
    ("skipVote", "{} has voted to skip the song! [{}/{}]"),
    ("skipped", "{} has skipped the song."),
    ("leaveVote", "{} has voted to stop the player! [{}/{}]"),
    ("left", "{} has stopped the player."),
    ("repeat", "Repeat mode has been set to `{}`."),
    ("setVolume", "Volume has been set to `{}%`."),
    ("missingPerms_mode", "Only the DJ or admins can change the repeat mode."),
    ("missingPerms_function", "Only the DJ or admins can use this function."),
    ("notInChannel", "{}, you must be in {} to use the player."),
    ("noTrackPlaying", "There is no track playing right now."),
    ("cooldown", "You're on cooldown for {} second{}!"),
    ("actionFailed", "Something went wrong while controlling the player."),
    ("buttonBack", "Back"),
    ("buttonPause", "Pause"),
    ("buttonResume", "Resume"),
    ("buttonSkip", "Skip"),
    ("buttonLeave", "Leave"),
    ("buttonLoop", "Loop"),
    ("buttonVolumeUp", "Louder"),
    ("buttonVolumeDown", "Quieter"),
    ("buttonVolumeMute", "Mute"),
    ("buttonVolumeUnmute", "Unmute"),
    ("playerDropdown", "Select a song to skip to"),
    ("live", "Live"),
];

/// Template catalog. Unknown keys render as the key itself.
#[derive(Debug, Clone)]
pub struct Messages {
    templates: HashMap<String, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            templates: DEFAULT_MESSAGES
                .iter()
                .map(|(key, template)| (key.to_string(), template.to_string()))
                .collect(),
        }
    }
}

impl Messages {
    /// Default templates overridden by the JSON object in `path`.
    pub fn with_overrides<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: HashMap<String, String> =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded {} message overrides from {:?}", overrides.len(), path);
        let mut messages = Self::default();
        messages.templates.extend(overrides);
        Ok(messages)
    }

    /// The raw template for `key`.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.templates.get(key).map_or(key, String::as_str)
    }

    /// Fills the `{}` placeholders of `key` in order. Surplus placeholders are
    /// left empty, surplus arguments are ignored.
    pub fn render<S: AsRef<str>>(&self, key: &str, args: &[S]) -> String {
        let template = self.get(key);
        let mut args = args.iter();
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find("{}") {
            rendered.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => rendered.push_str(arg.as_ref()),
                None => warn!("Template {} is missing an argument", key),
            }
            rest = &rest[pos + 2..];
        }
        rendered.push_str(rest);

        rendered
    }
}
