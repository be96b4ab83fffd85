//! Turns a `ControlSurface` into Discord message components.

use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption, ReactionType,
};
use tracing::warn;

use super::surface::{ButtonColor, Control, ControlKind, ControlSurface};

/// Prefix of every custom id owned by the controller.
pub const CUSTOM_ID_PREFIX: &str = "controller_";

/// Discord accepts at most this many action rows per message.
const MAX_ACTION_ROWS: usize = 5;

pub fn custom_id(kind: ControlKind) -> String {
    format!("{}{}", CUSTOM_ID_PREFIX, kind.id())
}

/// The control a component custom id refers to.
pub fn parse_custom_id(custom_id: &str) -> Option<ControlKind> {
    custom_id
        .strip_prefix(CUSTOM_ID_PREFIX)
        .and_then(ControlKind::from_id)
}

fn button_style(color: ButtonColor) -> ButtonStyle {
    match color {
        ButtonColor::Blue => ButtonStyle::Primary,
        ButtonColor::Grey => ButtonStyle::Secondary,
        ButtonColor::Red => ButtonStyle::Danger,
        ButtonColor::Green => ButtonStyle::Success,
    }
}

fn button(control: &Control) -> CreateButton {
    let mut button = CreateButton::new(custom_id(control.kind))
        .style(button_style(control.color))
        .label(control.label.clone())
        .disabled(control.disabled);

    if let Some(emoji) = control.emoji {
        button = button.emoji(ReactionType::Unicode(emoji.to_string()));
    }

    button
}

fn track_menu(control: &Control, surface: &ControlSurface) -> CreateSelectMenu {
    let options = surface
        .track_options
        .iter()
        .map(|option| {
            CreateSelectMenuOption::new(option.label.clone(), option.index.to_string())
                .description(option.description.clone())
        })
        .collect();

    CreateSelectMenu::new(
        custom_id(ControlKind::Tracks),
        CreateSelectMenuKind::String { options },
    )
    .placeholder(control.label.clone())
    .min_values(1)
    .max_values(1)
    .disabled(control.disabled)
}

/// Buttons of a grid row share an action row; the track dropdown always gets
/// a row of its own.
pub fn action_rows(surface: &ControlSurface) -> Vec<CreateActionRow> {
    let mut rows = Vec::new();

    for row in surface.row_indices() {
        let mut buttons = Vec::new();
        let mut menu = None;

        for control in surface.controls_in_row(row) {
            match control.kind {
                ControlKind::Tracks => menu = Some(track_menu(control, surface)),
                _ => buttons.push(button(control)),
            }
        }

        if !buttons.is_empty() {
            rows.push(CreateActionRow::Buttons(buttons));
        }
        if let Some(menu) = menu {
            rows.push(CreateActionRow::SelectMenu(menu));
        }
    }

    if rows.len() > MAX_ACTION_ROWS {
        warn!(
            "Controller layout has {} rows, dropping the last {}",
            rows.len(),
            rows.len() - MAX_ACTION_ROWS
        );
        rows.truncate(MAX_ACTION_ROWS);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::audio_sources::track_metadata::TrackMetadata;
    use crate::commands::music::controller::messages::Messages;
    use crate::commands::music::controller::player::{PlayerSnapshot, UserKey};
    use crate::commands::music::controller::surface::build_surface;
    use crate::config::{ControllerGrid, GridEntry};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_custom_id_round_trip() {
        assert_eq!(custom_id(ControlKind::VolumeUp), "controller_volumeup");
        assert_eq!(parse_custom_id("controller_skip"), Some(ControlKind::Skip));
        assert_eq!(parse_custom_id("controller_add"), None);
        assert_eq!(parse_custom_id("music_skip"), None);
    }

    #[test]
    fn test_dropdown_gets_its_own_row() {
        let grid = vec![vec![
            GridEntry::from("back"),
            GridEntry::from("tracks"),
            GridEntry::from("skip"),
        ]];
        let snapshot = PlayerSnapshot {
            current: Some(TrackMetadata::from_query("a", UserKey(1), "one".into())),
            upcoming: vec![TrackMetadata::from_query("b", UserKey(1), "one".into())],
            ..Default::default()
        };

        let surface = build_surface(&grid, &snapshot, &Messages::default());
        let rows = action_rows(&surface);

        assert_eq!(rows.len(), 2);
        assert_matches!(&rows[0], CreateActionRow::Buttons(buttons) if buttons.len() == 2);
        assert_matches!(&rows[1], CreateActionRow::SelectMenu(_));
    }

    #[test]
    fn test_rows_capped_at_discord_limit() {
        let grid: ControllerGrid = (0..7).map(|_| vec![GridEntry::from("skip")]).collect();

        let surface = build_surface(&grid, &PlayerSnapshot::default(), &Messages::default());

        assert_eq!(action_rows(&surface).len(), MAX_ACTION_ROWS);
    }
}
