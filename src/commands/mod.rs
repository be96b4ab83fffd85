//! This module aggregates all the command modules for the bot.

/// Music playback, the interactive controller and Spotify lookups.
pub mod music;
