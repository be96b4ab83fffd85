//! Playback queue with a history cursor and repeat modes.

use std::fmt;

use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

/// Repeat behaviour of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    Track,
    Queue,
}

impl RepeatMode {
    /// off -> track -> queue -> off
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::Track,
            RepeatMode::Track => RepeatMode::Queue,
            RepeatMode::Queue => RepeatMode::Off,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepeatMode::Off => "Off",
            RepeatMode::Track => "Track",
            RepeatMode::Queue => "Queue",
        };
        f.write_str(name)
    }
}

/// Every track ever queued, in order, and a cursor pointing at the next one
/// to play. Tracks before the cursor (minus the one playing) are history.
#[derive(Debug, Clone, Default)]
pub struct PlayerQueue {
    tracks: Vec<TrackMetadata>,
    position: usize,
    repeat: RepeatMode,
}

impl PlayerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I: IntoIterator<Item = TrackMetadata>>(&mut self, tracks: I) {
        self.tracks.extend(tracks);
    }

    /// Advances the cursor and returns the track to play.
    pub fn next(&mut self) -> Option<TrackMetadata> {
        if self.repeat == RepeatMode::Track && self.position > 0 {
            if let Some(track) = self.tracks.get(self.position - 1) {
                return Some(track.clone());
            }
        }

        if self.position >= self.tracks.len() {
            if self.repeat == RepeatMode::Queue && !self.tracks.is_empty() {
                self.position = 0;
            } else {
                return None;
            }
        }

        let track = self.tracks[self.position].clone();
        self.position += 1;
        Some(track)
    }

    /// Tracks that played before the current one.
    pub fn history(&self) -> &[TrackMetadata] {
        let end = self.position.saturating_sub(1).min(self.tracks.len());
        &self.tracks[..end]
    }

    pub fn has_history(&self) -> bool {
        !self.history().is_empty()
    }

    /// Tracks waiting to be played.
    pub fn upcoming(&self) -> &[TrackMetadata] {
        &self.tracks[self.position.min(self.tracks.len())..]
    }

    /// Moves the cursor `steps` tracks back.
    pub fn back_to(&mut self, steps: usize) {
        self.position = self.position.saturating_sub(steps);
    }

    /// Makes the 1-based `index` of the upcoming tracks the next to play.
    pub fn skip_to(&mut self, index: usize) {
        let skipped = index.saturating_sub(1);
        self.position = (self.position + skipped).min(self.tracks.len());
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::controller::player::UserKey;
    use pretty_assertions::assert_eq;

    fn track(title: &str) -> TrackMetadata {
        TrackMetadata::from_query(title, UserKey(1), "one".to_string())
    }

    fn queue_of(titles: &[&str]) -> PlayerQueue {
        let mut queue = PlayerQueue::new();
        queue.extend(titles.iter().map(|title| track(title)));
        queue
    }

    fn titles(tracks: &[TrackMetadata]) -> Vec<&str> {
        tracks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_next_walks_the_queue_and_builds_history() {
        let mut queue = queue_of(&["a", "b", "c"]);

        assert_eq!(queue.next().unwrap().title, "a");
        assert!(!queue.has_history());
        assert_eq!(queue.next().unwrap().title, "b");
        assert_eq!(titles(queue.history()), vec!["a"]);
        assert_eq!(titles(queue.upcoming()), vec!["c"]);
        assert_eq!(queue.next().unwrap().title, "c");
        assert!(queue.next().is_none());
        assert!(queue.upcoming().is_empty());
    }

    #[test]
    fn test_back_while_playing_replays_previous_track() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.next();
        queue.next();

        queue.back_to(2);

        assert_eq!(queue.next().unwrap().title, "a");
    }

    #[test]
    fn test_back_when_idle_replays_last_track() {
        let mut queue = queue_of(&["a", "b"]);
        queue.next();
        queue.next();
        assert!(queue.next().is_none());

        queue.back_to(1);

        assert_eq!(queue.next().unwrap().title, "b");
    }

    #[test]
    fn test_back_saturates_at_start() {
        let mut queue = queue_of(&["a"]);
        queue.back_to(5);
        assert_eq!(queue.next().unwrap().title, "a");
    }

    #[test]
    fn test_skip_to_jumps_over_upcoming_tracks() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.next();

        queue.skip_to(3);

        assert_eq!(queue.next().unwrap().title, "d");
        assert_eq!(titles(queue.history()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_skip_to_past_end_empties_queue() {
        let mut queue = queue_of(&["a", "b"]);
        queue.skip_to(10);
        assert!(queue.upcoming().is_empty());
    }

    #[test]
    fn test_track_repeat_returns_current_track() {
        let mut queue = queue_of(&["a", "b"]);
        queue.next();
        queue.set_repeat(RepeatMode::Track);

        assert_eq!(queue.next().unwrap().title, "a");
        assert_eq!(queue.next().unwrap().title, "a");
    }

    #[test]
    fn test_queue_repeat_wraps_around() {
        let mut queue = queue_of(&["a", "b"]);
        queue.set_repeat(RepeatMode::Queue);

        queue.next();
        queue.next();

        assert_eq!(queue.next().unwrap().title, "a");
    }

    #[test]
    fn test_repeat_cycle_and_display() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::Track);
        assert_eq!(RepeatMode::Track.cycle(), RepeatMode::Queue);
        assert_eq!(RepeatMode::Queue.cycle(), RepeatMode::Off);
        assert_eq!(RepeatMode::Queue.to_string(), "Queue");
    }
}
