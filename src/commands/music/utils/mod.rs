// Export music utilities
pub mod component_handlers;
pub mod discord_player;
pub mod embedded_messages;
pub mod event_handlers;
pub mod music_manager;
pub mod queue;
