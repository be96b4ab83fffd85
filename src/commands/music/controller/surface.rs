//! Derives the set of controls shown on the player message from the configured
//! grid and the player's state.

use crate::config::ControllerGrid;

use super::messages::Messages;
use super::player::PlayerSnapshot;

/// Maximum number of upcoming tracks offered in the dropdown.
pub const MAX_TRACK_OPTIONS: usize = 10;

/// Every control the grid may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Back,
    Resume,
    Skip,
    Stop,
    Loop,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Tracks,
}

const REGISTRY: &[(&str, ControlKind)] = &[
    ("back", ControlKind::Back),
    ("resume", ControlKind::Resume),
    ("skip", ControlKind::Skip),
    ("stop", ControlKind::Stop),
    ("loop", ControlKind::Loop),
    ("volumeup", ControlKind::VolumeUp),
    ("volumedown", ControlKind::VolumeDown),
    ("volumemute", ControlKind::VolumeMute),
    ("tracks", ControlKind::Tracks),
];

impl ControlKind {
    /// Resolves a grid identifier, ignoring case.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.to_ascii_lowercase();
        REGISTRY
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, kind)| *kind)
    }

    pub fn id(self) -> &'static str {
        match self {
            ControlKind::Back => "back",
            ControlKind::Resume => "resume",
            ControlKind::Skip => "skip",
            ControlKind::Stop => "stop",
            ControlKind::Loop => "loop",
            ControlKind::VolumeUp => "volumeup",
            ControlKind::VolumeDown => "volumedown",
            ControlKind::VolumeMute => "volumemute",
            ControlKind::Tracks => "tracks",
        }
    }
}

/// Button colors accepted in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonColor {
    Blue,
    #[default]
    Grey,
    Red,
    Green,
}

impl ButtonColor {
    /// Unknown or missing names fall back to grey.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("blue") => ButtonColor::Blue,
            Some("red") => ButtonColor::Red,
            Some("green") => ButtonColor::Green,
            _ => ButtonColor::Grey,
        }
    }
}

/// A control placed at its grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub kind: ControlKind,
    pub color: ButtonColor,
    pub row: usize,
    pub column: usize,
    pub disabled: bool,
    pub label: String,
    pub emoji: Option<&'static str>,
}

/// One entry of the track dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOption {
    /// 1-based position among the upcoming tracks.
    pub index: usize,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSurface {
    pub controls: Vec<Control>,
    pub track_options: Vec<TrackOption>,
}

impl ControlSurface {
    pub fn control(&self, kind: ControlKind) -> Option<&Control> {
        self.controls.iter().find(|control| control.kind == kind)
    }

    /// Row indices that hold at least one control, in order.
    pub fn row_indices(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.controls.iter().map(|control| control.row).collect();
        rows.dedup();
        rows
    }

    pub fn controls_in_row(&self, row: usize) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(move |control| control.row == row)
    }
}

/// Lays out the controls of `grid` for the player state in `snapshot`.
pub fn build_surface(
    grid: &ControllerGrid,
    snapshot: &PlayerSnapshot,
    messages: &Messages,
) -> ControlSurface {
    let mut controls = Vec::new();

    for (row, entries) in grid.iter().enumerate() {
        for (column, entry) in entries.iter().enumerate() {
            let (id, color) = entry.parts();
            let Some(kind) = id.and_then(ControlKind::from_id) else {
                continue;
            };

            if kind == ControlKind::Tracks && snapshot.upcoming.is_empty() {
                continue;
            }

            let (label, emoji) = appearance(kind, snapshot, messages);
            controls.push(Control {
                kind,
                color: ButtonColor::from_name(color),
                row,
                column,
                disabled: is_disabled(kind, snapshot),
                label,
                emoji,
            });
        }
    }

    let track_options = if controls.iter().any(|c| c.kind == ControlKind::Tracks) {
        track_options(snapshot, messages)
    } else {
        Vec::new()
    };

    ControlSurface {
        controls,
        track_options,
    }
}

fn is_disabled(kind: ControlKind, snapshot: &PlayerSnapshot) -> bool {
    match kind {
        ControlKind::Back => !snapshot.has_history && !snapshot.is_playing(),
        ControlKind::Resume => !snapshot.is_playing(),
        _ => false,
    }
}

fn appearance(
    kind: ControlKind,
    snapshot: &PlayerSnapshot,
    messages: &Messages,
) -> (String, Option<&'static str>) {
    let (key, emoji) = match kind {
        ControlKind::Back => ("buttonBack", Some("⏮️")),
        ControlKind::Resume if snapshot.is_paused => ("buttonResume", Some("▶️")),
        ControlKind::Resume => ("buttonPause", Some("⏸️")),
        ControlKind::Skip => ("buttonSkip", Some("⏭️")),
        ControlKind::Stop => ("buttonLeave", Some("⏹️")),
        ControlKind::Loop => ("buttonLoop", Some("🔁")),
        ControlKind::VolumeUp => ("buttonVolumeUp", Some("🔊")),
        ControlKind::VolumeDown => ("buttonVolumeDown", Some("🔉")),
        ControlKind::VolumeMute if snapshot.volume == 0 => ("buttonVolumeUnmute", Some("🔈")),
        ControlKind::VolumeMute => ("buttonVolumeMute", Some("🔇")),
        ControlKind::Tracks => ("playerDropdown", None),
    };
    (messages.get(key).to_string(), emoji)
}

fn track_options(snapshot: &PlayerSnapshot, messages: &Messages) -> Vec<TrackOption> {
    snapshot
        .upcoming
        .iter()
        .take(MAX_TRACK_OPTIONS)
        .enumerate()
        .map(|(i, track)| {
            let index = i + 1;
            let length = if track.is_stream {
                messages.get("live").to_string()
            } else {
                track.format_length().unwrap_or_else(|| "--:--".to_string())
            };
            TrackOption {
                index,
                label: format!("{}. {}", index, truncate(&track.title, 40)),
                description: format!("{} · {}", truncate(&track.author, 30), length),
            }
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
