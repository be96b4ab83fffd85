pub mod discover;
pub mod play;

pub mod audio_sources;
pub mod controller;
pub mod utils;
