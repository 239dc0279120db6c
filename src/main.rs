// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (SQLite stores)
// - `discord/` = Discord-specific adapters (commands, events, embeds)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework and event reactors
// 4. Run until interrupted, then shut down cleanly

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::commands::CommandRegistry;
use crate::core::leveling::LevelingService;
use crate::core::logging::MessageLogService;
use crate::core::moderation::{MuteScheduler, WarningService};
use crate::discord::commands::presence;
use crate::discord::commands::server_stats::refresh_member_count;
use crate::discord::logging::events as logging_events;
use crate::discord::message_pipeline::handle_message;
use crate::discord::{Data, Error};
use crate::infra::leveling::SqliteExperienceStore;
use crate::infra::logging::SqliteMessageLogStore;
use crate::infra::moderation::SqliteWarningStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Event handler for everything the bot reacts to. There are no framework
/// commands; `!` commands are dispatched from the message pipeline.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            handle_message(ctx, data, new_message).await;
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            ..
        } => {
            if let Err(e) =
                logging_events::handle_message_delete(ctx, data, *channel_id, *deleted_message_id)
                    .await
            {
                tracing::error!("Error handling message delete: {}", e);
            }
        }
        serenity::FullEvent::MessageUpdate { new, event, .. } => {
            logging_events::handle_message_update(data, new.as_ref(), event);
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = logging_events::handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error handling member join: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            if let Err(e) = logging_events::handle_member_remove(ctx, data, *guild_id, user).await {
                tracing::error!("Error handling member remove: {}", e);
            }
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("{} is online!", data_about_bot.user.name);
        }
        // Member counts need the guild in cache, which isn't guaranteed at Ready.
        serenity::FullEvent::CacheReady { guilds } => {
            if let Some(guild_id) = data.config.guild_id {
                let guild_id = serenity::GuildId::new(guild_id);
                if guilds.contains(&guild_id) {
                    refresh_member_count(ctx, data, guild_id).await;
                } else {
                    tracing::warn!(guild_id = guild_id.get(), "Configured GUILD_ID is not joined");
                }
            }
        }

        _ => {}
    }

    Ok(())
}

/// Periodically drop message snapshots older than the configured retention.
fn spawn_retention_sweep(
    message_log: Arc<MessageLogService<SqliteMessageLogStore>>,
    retention_days: u32,
) {
    let max_age = chrono::Duration::days(i64::from(retention_days));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match message_log.prune_older_than(max_age).await {
                Ok(0) => tracing::debug!("Message log retention sweep found nothing to prune"),
                Ok(pruned) => tracing::info!(pruned, "Pruned old message log entries"),
                Err(e) => tracing::warn!("Message log retention sweep failed: {}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,serenity=warn")),
        )
        .init();

    let config = Arc::new(BotConfig::from_env()?);
    config.log_disabled_features();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let pool = infra::connect_pool(&config.database_url)
        .await
        .context("Failed to open the database")?;

    let xp_store = SqliteExperienceStore::new(pool.clone());
    xp_store.migrate().await.context("Failed to migrate experience table")?;

    let warning_store = SqliteWarningStore::new(pool.clone());
    warning_store
        .migrate()
        .await
        .context("Failed to migrate warnings table")?;

    let log_store = SqliteMessageLogStore::new(pool.clone());
    log_store.migrate().await.context("Failed to migrate message log")?;

    let commands = CommandRegistry::builtin().context("Invalid command table")?;
    tracing::info!(commands = commands.len(), prefix = %config.prefix, "Command registry ready");

    let data = Data {
        config: Arc::clone(&config),
        commands: Arc::new(commands),
        leveling: Arc::new(LevelingService::new(xp_store)),
        warnings: Arc::new(WarningService::new(warning_store)),
        message_log: Arc::new(MessageLogService::new(log_store)),
        mutes: Arc::new(MuteScheduler::new()),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, _framework| {
            Box::pin(async move {
                presence::on_ready(ctx);

                if let Some(days) = data.config.message_log_retention_days {
                    spawn_retention_sweep(Arc::clone(&data.message_log), days);
                }

                tracing::info!("🚀 Bot is ready!");
                Ok(data)
            })
        })
        .build();

    // Deleted-message lookups for ghost pings fall back to this cache.
    let mut settings = serenity::cache::Settings::default();
    settings.max_messages = 10000;

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .cache_settings(settings)
        .await
        .context("Error creating client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    client.start().await.context("Error running bot")?;

    pool.close().await;
    Ok(())
}
