// One-shot announcement: log in, post the announcement to every text channel
// whose name matches one of the target names in every joined guild, then exit.
//
// Reads DISCORD_TOKEN, ANNOUNCE_CHANNEL_NAMES (comma separated) and
// ANNOUNCE_MESSAGE from the environment or `.env`.

use anyhow::Context as _;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_CHANNEL_NAMES: &str = "general,general-chat,chat,bot-commands";
const DEFAULT_MESSAGE: &str =
    "**📢 Announcement 📢**\n\n**use (!help)** to know about commands available for using me";

/// Pause between sends to stay clear of rate limits.
const SEND_DELAY: Duration = Duration::from_millis(2000);

fn parse_channel_names(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or(DEFAULT_CHANNEL_NAMES)
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

struct Announcer {
    channel_names: Vec<String>,
    message: String,
}

impl Announcer {
    async fn announce_in(&self, ctx: &serenity::Context, guild_id: serenity::GuildId) {
        let channels = match guild_id.channels(&ctx.http).await {
            Ok(channels) => channels,
            Err(e) => {
                tracing::error!(guild_id = guild_id.get(), "Failed to list channels: {}", e);
                return;
            }
        };

        for target in &self.channel_names {
            let Some(channel) = channels
                .values()
                .find(|c| c.kind == serenity::ChannelType::Text && &c.name == target)
            else {
                tracing::info!(guild_id = guild_id.get(), "Channel \"{}\" not found", target);
                continue;
            };

            match channel.id.say(&ctx.http, &self.message).await {
                Ok(_) => tracing::info!(channel = %channel.name, "Announcement sent"),
                Err(e) => tracing::error!(
                    channel = %channel.name,
                    channel_id = channel.id.get(),
                    "Failed to send announcement: {}",
                    e
                ),
            }
            tokio::time::sleep(SEND_DELAY).await;
        }
    }
}

#[async_trait]
impl serenity::EventHandler for Announcer {
    async fn ready(&self, ctx: serenity::Context, ready: serenity::Ready) {
        tracing::info!("Logged in as {}!", ready.user.tag());

        for guild in &ready.guilds {
            self.announce_in(&ctx, guild.id).await;
        }

        tracing::info!("Announcement finished, disconnecting");
        ctx.shard.shutdown_clean();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,serenity=warn")),
        )
        .init();

    let token = std::env::var("DISCORD_TOKEN")
        .context("Missing DISCORD_TOKEN environment variable! Add it to your .env file.")?;

    let handler = Announcer {
        channel_names: parse_channel_names(std::env::var("ANNOUNCE_CHANNEL_NAMES").ok().as_deref()),
        message: std::env::var("ANNOUNCE_MESSAGE").unwrap_or_else(|_| DEFAULT_MESSAGE.to_string()),
    };

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .event_handler(handler)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running announcer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_channel_names() {
        assert_eq!(
            parse_channel_names(None),
            vec!["general", "general-chat", "chat", "bot-commands"]
        );
    }

    #[test]
    fn configured_names_are_trimmed() {
        assert_eq!(
            parse_channel_names(Some(" news , ,announcements")),
            vec!["news", "announcements"]
        );
    }
}
