use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jukebox::commands::music::audio_sources::spotify::{SpotifyClient, SpotifyConfig};
use jukebox::commands::music::controller::messages::Messages;
use jukebox::commands::music::{discover::*, play::*};
use jukebox::config::{Config, Settings};
use jukebox::events::Handler;
use jukebox::{CommandResult, Context, Data, Error};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jukebox=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;
    let settings = Settings::load(&config.settings_path)?;

    let messages = match &settings.language_file {
        Some(path) => Messages::with_overrides(path)?,
        None => Messages::default(),
    };

    let spotify = SpotifyClient::new(SpotifyConfig {
        client_id: config.spotify_client_id.clone(),
        client_secret: config.spotify_client_secret.clone(),
        market: settings.market.clone(),
        ..Default::default()
    })?;

    if settings.vote_disable {
        warn!("Voting is disabled, every listener controls the player");
    }

    let data = Data {
        settings: Arc::new(settings),
        messages: Arc::new(messages),
        spotify: Arc::new(spotify),
    };

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Music commands
        play(),
        // Spotify lookups
        search(),
        recommend(),
        categories(),
    ];

    let framework_data = data.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(framework_data)
            })
        });

    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework.build())
        .event_handler(Handler { data })
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
