use crate::core::logging::{detect_ghost_ping, DeletedSnapshot};
use crate::core::moderation::MuteKey;
use crate::discord::commands::server_stats::refresh_member_count;
use crate::discord::logging::formatter::{dm_forward_embed, ghost_ping_embed, welcome_embed};
use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};

/// Snapshot of a live message in the monitored channel, kept so a later delete
/// can be checked for ghost pings. Other channels are not tracked.
pub fn track_monitored_message(data: &Data, message: &serenity::Message) {
    if data.config.monitored_channel_id != Some(message.channel_id.get()) {
        return;
    }

    data.message_log
        .track_recent(message.id.get(), snapshot_of(message));
}

fn snapshot_of(message: &serenity::Message) -> DeletedSnapshot {
    DeletedSnapshot {
        channel_id: message.channel_id.get(),
        author_id: message.author.id.get(),
        author_tag: message.author.tag(),
        content: message.content.clone(),
        mentioned_user_ids: message.mentions.iter().map(|u| u.id.get()).collect(),
    }
}

/// Keep the monitored-channel snapshot in step with edits, so a delete checks
/// the mentions the message had last.
pub fn handle_message_update(
    data: &Data,
    new: Option<&serenity::Message>,
    event: &serenity::MessageUpdateEvent,
) {
    if data.config.monitored_channel_id != Some(event.channel_id.get()) {
        return;
    }

    let mentions = event
        .mentions
        .as_ref()
        .map(|users| users.iter().map(|u| u.id.get()).collect());

    if data
        .message_log
        .refresh_recent(event.id.get(), event.content.as_deref(), mentions)
    {
        tracing::debug!(message_id = event.id.get(), "Refreshed tracked message after edit");
        return;
    }

    // Sent before startup or evicted: the cache copy already has the edit applied.
    if let Some(message) = new {
        track_monitored_message(data, message);
    }
}

pub async fn handle_message_delete(
    ctx: &Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<()> {
    let Some(monitored) = data.config.monitored_channel_id else {
        return Ok(());
    };
    if channel_id.get() != monitored {
        return Ok(());
    }

    // Prefer our own snapshot; the gateway cache may already have dropped the message.
    let snapshot = data.message_log.take_recent(message_id.get()).or_else(|| {
        ctx.cache
            .message(channel_id, message_id)
            .map(|message| snapshot_of(&message))
    });

    let Some(snapshot) = snapshot else {
        tracing::debug!(message_id = message_id.get(), "Deleted message was not cached");
        return Ok(());
    };

    let Some(ping) = detect_ghost_ping(&snapshot, Some(monitored)) else {
        return Ok(());
    };

    tracing::info!(
        author_id = ping.author_id,
        mentions = ping.mentioned_user_ids.len(),
        "Ghost ping detected"
    );

    let Some(alert_channel) = data.config.alert_channel_id else {
        tracing::warn!("Ghost ping detected but no alert channel is configured");
        return Ok(());
    };

    serenity::ChannelId::new(alert_channel)
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().embed(ghost_ping_embed(&ping)),
        )
        .await?;
    Ok(())
}

/// Copy a direct message to the staff forwarding channel.
pub async fn forward_direct_message(
    ctx: &Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<()> {
    let Some(forward_channel) = data.config.dm_forward_channel_id else {
        return Ok(());
    };

    serenity::ChannelId::new(forward_channel)
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().embed(dm_forward_embed(&message.author, &message.content)),
        )
        .await?;
    Ok(())
}

pub async fn handle_member_join(ctx: &Context, data: &Data, member: &serenity::Member) -> Result<()> {
    refresh_member_count(ctx, data, member.guild_id).await;

    let Some(welcome_channel) = data.config.welcome_channel_id else {
        return Ok(());
    };

    let guild_name = member
        .guild_id
        .name(&ctx.cache)
        .unwrap_or_else(|| "the server".to_string());

    serenity::ChannelId::new(welcome_channel)
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().embed(welcome_embed(
                &guild_name,
                &member.user,
                &data.config,
            )),
        )
        .await?;
    Ok(())
}

/// A member left: drop any pending auto-unmute and refresh the member count.
pub async fn handle_member_remove(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let key = MuteKey {
        guild_id: guild_id.get(),
        user_id: user.id.get(),
    };
    if data.mutes.cancel(key) {
        tracing::debug!(user_id = user.id.get(), "Cancelled pending unmute for departed member");
    }

    refresh_member_count(ctx, data, guild_id).await;
    Ok(())
}
