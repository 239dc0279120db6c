// Member count channel. Renamed on ready and whenever someone joins or leaves.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub fn member_count_label(count: u64) -> String {
    format!("Members: {}", count)
}

/// Rename the configured member-count channel to the guild's current member count.
/// Does nothing when the channel isn't configured or the guild isn't cached yet.
pub async fn update_member_count(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
) -> Result<(), Error> {
    let Some(channel_id) = data.config.member_count_channel_id else {
        return Ok(());
    };

    let Some(member_count) = guild_id.to_guild_cached(&ctx.cache).map(|g| g.member_count) else {
        tracing::debug!(guild_id = guild_id.get(), "Guild not cached; skipping member count");
        return Ok(());
    };

    serenity::ChannelId::new(channel_id)
        .edit(
            &ctx,
            serenity::EditChannel::new().name(member_count_label(member_count)),
        )
        .await?;

    tracing::debug!(guild_id = guild_id.get(), member_count, "Updated member count channel");
    Ok(())
}

/// Fire-and-forget wrapper for event reactors: failures are only logged.
pub async fn refresh_member_count(ctx: &serenity::Context, data: &Data, guild_id: serenity::GuildId) {
    if let Err(e) = update_member_count(ctx, data, guild_id).await {
        tracing::warn!(guild_id = guild_id.get(), "Failed to update member count: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_shows_count() {
        assert_eq!(member_count_label(1234), "Members: 1234");
    }
}
