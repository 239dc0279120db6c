// Moderation commands: ban, mute, unmute, unban, warn, addrole, purge.
//
// Permission checks happen in the dispatcher before these run. Each handler
// resolves its target, answers usage problems with a reply, and lets platform
// failures bubble up to the dispatcher's generic error reply.

use super::dispatcher::CommandContext;
use crate::core::moderation::{
    parse_user_id, plan_bulk_delete, purge_targets, require_member, require_mention,
    require_mute_role, require_role, require_role_and_mention, ModerationAction, MuteDuration,
    MuteKey, PurgeAmount, TargetError, WarnOutcome, PURGE_CONFIRMATION_TTL, WARN_BAN_THRESHOLD,
};
use crate::discord::Error;
use poise::serenity_prelude as serenity;

/// Answer an unresolvable target and stop the command.
async fn refuse(
    cmd: &CommandContext<'_>,
    action: ModerationAction,
    reason: TargetError,
) -> Result<(), Error> {
    tracing::debug!(
        ?action,
        moderator_id = cmd.msg.author.id.get(),
        "Moderation target refused: {}",
        reason
    );
    cmd.reply(reason.to_string()).await?;
    Ok(())
}

pub async fn ban(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let user = match require_mention(ModerationAction::Ban, cmd.first_mention()) {
        Ok(user) => user,
        Err(e) => return refuse(cmd, ModerationAction::Ban, e).await,
    };
    if let Err(e) = require_member(cmd.member(guild_id, user.id).await) {
        return refuse(cmd, ModerationAction::Ban, e).await;
    }

    guild_id.ban(&cmd.ctx.http, user.id, 0).await?;
    tracing::info!(
        guild_id = guild_id.get(),
        user_id = user.id.get(),
        moderator_id = cmd.msg.author.id.get(),
        "Member banned"
    );

    cmd.reply(format!("{} has been banned.", user.tag())).await?;
    Ok(())
}

pub async fn mute(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let user = match require_mention(ModerationAction::Mute, cmd.first_mention()) {
        Ok(user) => user,
        Err(e) => return refuse(cmd, ModerationAction::Mute, e).await,
    };
    // args[0] is the mention itself
    let duration_arg = cmd.arg(1).unwrap_or("0");

    let member = match require_member(cmd.member(guild_id, user.id).await) {
        Ok(member) => member,
        Err(e) => return refuse(cmd, ModerationAction::Mute, e).await,
    };
    let role_id =
        match require_mute_role(cmd.role_named(guild_id, &cmd.data.config.muted_role_name)) {
            Ok(role_id) => role_id,
            Err(e) => return refuse(cmd, ModerationAction::Mute, e).await,
        };

    member.add_role(&cmd.ctx.http, role_id).await?;
    cmd.reply(format!("{} has been muted for {}.", user.tag(), duration_arg))
        .await?;

    let key = MuteKey {
        guild_id: guild_id.get(),
        user_id: user.id.get(),
    };
    let duration = MuteDuration::parse(duration_arg);

    let Some(delay) = duration.unmute_after() else {
        // Indefinite mute: an older timer must not lift it
        cmd.data.mutes.cancel(key);
        return Ok(());
    };

    tracing::info!(
        guild_id = key.guild_id,
        user_id = key.user_id,
        minutes = duration.minutes(),
        "Scheduling automatic unmute"
    );

    let http = cmd.ctx.http.clone();
    let channel_id = cmd.msg.channel_id;
    let user_id = user.id;
    let tag = user.tag();

    cmd.data.mutes.schedule(key, delay, async move {
        if let Err(e) = http
            .remove_member_role(guild_id, user_id, role_id, Some("Mute expired"))
            .await
        {
            tracing::warn!(
                guild_id = guild_id.get(),
                user_id = user_id.get(),
                "Automatic unmute failed: {}",
                e
            );
            return;
        }

        if let Err(e) = channel_id
            .say(&http, format!("{} has been unmuted.", tag))
            .await
        {
            tracing::warn!("Failed to announce unmute: {}", e);
        }
    });

    Ok(())
}

pub async fn unmute(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let user = match require_mention(ModerationAction::Unmute, cmd.first_mention()) {
        Ok(user) => user,
        Err(e) => return refuse(cmd, ModerationAction::Unmute, e).await,
    };
    let member = match require_member(cmd.member(guild_id, user.id).await) {
        Ok(member) => member,
        Err(e) => return refuse(cmd, ModerationAction::Unmute, e).await,
    };
    let role_id =
        match require_mute_role(cmd.role_named(guild_id, &cmd.data.config.muted_role_name)) {
            Ok(role_id) => role_id,
            Err(e) => return refuse(cmd, ModerationAction::Unmute, e).await,
        };

    let cancelled = cmd.data.mutes.cancel(MuteKey {
        guild_id: guild_id.get(),
        user_id: user.id.get(),
    });
    if cancelled {
        tracing::debug!(user_id = user.id.get(), "Cancelled pending unmute");
    }

    member.remove_role(&cmd.ctx.http, role_id).await?;
    cmd.reply(format!("{} has been unmuted.", user.tag())).await?;
    Ok(())
}

pub async fn unban(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let user_id = match parse_user_id(cmd.arg(0)) {
        Ok(user_id) => user_id,
        Err(e) => return refuse(cmd, ModerationAction::Unban, e).await,
    };

    // No existence check: the ban entry is removed by id directly
    guild_id
        .unban(&cmd.ctx.http, serenity::UserId::new(user_id))
        .await?;

    cmd.reply(format!("User with ID {} has been unbanned.", user_id))
        .await?;
    Ok(())
}

pub async fn warn(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let user = match require_mention(ModerationAction::Warn, cmd.first_mention()) {
        Ok(user) => user,
        Err(e) => return refuse(cmd, ModerationAction::Warn, e).await,
    };

    match cmd.data.warnings.warn(user.id.get()).await? {
        WarnOutcome::Warned { total } => {
            cmd.reply(format!(
                "{} has been warned. Total warnings: {}",
                user.tag(),
                total
            ))
            .await?;
        }
        WarnOutcome::BanThreshold { warnings } => {
            if let Err(e) = require_member(cmd.member(guild_id, user.id).await) {
                return refuse(cmd, ModerationAction::Warn, e).await;
            }

            guild_id.ban(&cmd.ctx.http, user.id, 0).await?;
            tracing::info!(
                guild_id = guild_id.get(),
                user_id = user.id.get(),
                warnings,
                "Member banned after reaching warning threshold"
            );

            cmd.reply(format!(
                "{} has been banned after {} warnings.",
                user.tag(),
                WARN_BAN_THRESHOLD
            ))
            .await?;
        }
    }

    Ok(())
}

pub async fn addrole(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let (role_name, user) = match require_role_and_mention(cmd.arg(0), cmd.first_mention()) {
        Ok(target) => target,
        Err(e) => return refuse(cmd, ModerationAction::AddRole, e).await,
    };
    let role_id = match require_role(cmd.role_named(guild_id, role_name)) {
        Ok(role_id) => role_id,
        Err(e) => return refuse(cmd, ModerationAction::AddRole, e).await,
    };
    let member = match require_member(cmd.member(guild_id, user.id).await) {
        Ok(member) => member,
        Err(e) => return refuse(cmd, ModerationAction::AddRole, e).await,
    };

    member.add_role(&cmd.ctx.http, role_id).await?;
    cmd.reply(format!("Role {} added to {}.", role_name, user.tag()))
        .await?;
    Ok(())
}

pub async fn purge(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let amount = match PurgeAmount::parse(cmd.arg(0)) {
        Ok(amount) => amount,
        Err(e) => return refuse(cmd, ModerationAction::Purge, TargetError::from(e)).await,
    };

    let deleted = match delete_recent(cmd, amount).await {
        Ok(deleted) => deleted,
        Err(e) => {
            tracing::error!("Error deleting messages: {}", e);
            cmd.reply("There was an error trying to purge messages.")
                .await?;
            return Ok(());
        }
    };
    tracing::info!(
        channel_id = cmd.msg.channel_id.get(),
        requested = amount.requested(),
        deleted,
        "Purged messages"
    );

    // The command message is gone, so this can't be a reply
    let confirmation = cmd
        .msg
        .channel_id
        .say(
            &cmd.ctx.http,
            format!("Successfully deleted {} message(s).", amount.requested()),
        )
        .await?;

    let http = cmd.ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(PURGE_CONFIRMATION_TTL).await;
        if let Err(e) = confirmation.delete(&http).await {
            tracing::debug!("Failed to delete purge confirmation: {}", e);
        }
    });

    Ok(())
}

/// Delete the requested number of messages before the command, plus the command itself.
/// Messages past the bulk-delete age limit are skipped. Returns how many were deleted.
async fn delete_recent(cmd: &CommandContext<'_>, amount: PurgeAmount) -> Result<usize, Error> {
    let channel_id = cmd.msg.channel_id;
    let history = channel_id
        .messages(
            &cmd.ctx.http,
            serenity::GetMessages::new()
                .before(cmd.msg.id)
                .limit(amount.requested() as u8),
        )
        .await?;

    let history: Vec<(u64, i64)> = history
        .iter()
        .map(|m| (m.id.get(), m.timestamp.unix_timestamp()))
        .collect();
    let ids = purge_targets(&history, cmd.msg.id.get(), chrono::Utc::now().timestamp());

    for batch in plan_bulk_delete(&ids) {
        let batch: Vec<serenity::MessageId> =
            batch.into_iter().map(serenity::MessageId::new).collect();
        if let [single] = batch.as_slice() {
            channel_id.delete_message(&cmd.ctx.http, *single).await?;
        } else {
            channel_id.delete_messages(&cmd.ctx.http, batch).await?;
        }
    }

    Ok(ids.len())
}
