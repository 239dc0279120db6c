// Informational commands about the server and its members.

use super::dispatcher::CommandContext;
use crate::discord::logging::formatter::{truncate_field, EMBED_FIELD_LIMIT};
use crate::discord::Error;
use poise::serenity_prelude as serenity;

const INFO_COLOR: u32 = 0x0099ff;
const DATE_FORMAT: &str = "%a %b %d %Y";

/// Snapshot of the cached guild fields `serverinfo` needs, taken before any await.
struct GuildSummary {
    name: String,
    member_count: u64,
    owner_id: serenity::UserId,
    icon_url: Option<String>,
}

fn cached_summary(cmd: &CommandContext<'_>, guild_id: serenity::GuildId) -> Option<GuildSummary> {
    let guild = cmd.ctx.cache.guild(guild_id)?;
    let summary = GuildSummary {
        name: guild.name.clone(),
        member_count: guild.member_count,
        owner_id: guild.owner_id,
        icon_url: guild.icon_url(),
    };
    Some(summary)
}

pub async fn serverinfo(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let summary = cached_summary(cmd, guild_id).ok_or("Guild not in cache")?;
    let owner = summary.owner_id.to_user(cmd.ctx).await?;

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Server Info: {}", summary.name))
        .color(INFO_COLOR)
        .field("Members", summary.member_count.to_string(), true)
        .field(
            "Created On",
            guild_id.created_at().format(DATE_FORMAT).to_string(),
            true,
        )
        .field("Owner", owner.tag(), true);
    if let Some(icon) = summary.icon_url {
        embed = embed.thumbnail(icon);
    }

    cmd.reply_embed(embed).await?;
    Ok(())
}

pub async fn mods(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let role_name = &cmd.data.config.mod_role_name;
    let Some(role_id) = cmd.role_named(guild_id, role_name) else {
        cmd.reply(format!("Role \"{}\" not found.", role_name)).await?;
        return Ok(());
    };

    let mut holders: Vec<String> = match cmd.ctx.cache.guild(guild_id) {
        Some(guild) => guild
            .members
            .values()
            .filter(|m| m.roles.contains(&role_id))
            .map(|m| m.user.tag())
            .collect(),
        None => Vec::new(),
    };
    holders.sort();

    if holders.is_empty() {
        cmd.reply(format!("No members with the role \"{}\".", role_name))
            .await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title(format!("Members with the \"{}\" Role", role_name))
        .description(holders.join("\n"))
        .color(INFO_COLOR);
    cmd.reply_embed(embed).await?;
    Ok(())
}

pub async fn userinfo(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let user = cmd.target_or_author();
    let Some(member) = cmd.member(guild_id, user.id).await else {
        cmd.reply("User is not a member of this server.").await?;
        return Ok(());
    };

    let joined = member
        .joined_at
        .map(|ts| ts.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let role_names: Vec<String> = match cmd.ctx.cache.guild(guild_id) {
        Some(guild) => member
            .roles
            .iter()
            .filter_map(|id| guild.roles.get(id))
            .map(|role| role.name.clone())
            .collect(),
        None => Vec::new(),
    };
    let roles = if role_names.is_empty() {
        "None".to_string()
    } else {
        truncate_field(&role_names.join(", "), EMBED_FIELD_LIMIT)
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("{}'s Info", user.tag()))
        .thumbnail(user.face())
        .color(INFO_COLOR)
        .field("User ID", user.id.to_string(), true)
        .field("Joined Server", joined, true)
        .field("Roles", roles, false);
    cmd.reply_embed(embed).await?;
    Ok(())
}

pub async fn dp(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let user = cmd.target_or_author();
    let embed = serenity::CreateEmbed::new()
        .title(format!("{}'s Profile Picture", user.tag()))
        .image(user.face())
        .color(INFO_COLOR);
    cmd.reply_embed(embed).await?;
    Ok(())
}

pub async fn serverdp(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = cmd.require_guild().await? else {
        return Ok(());
    };
    let icon = cmd
        .ctx
        .cache
        .guild(guild_id)
        .and_then(|guild| guild.icon_url());

    let Some(icon) = icon else {
        cmd.reply("This server has no icon.").await?;
        return Ok(());
    };

    let embed = serenity::CreateEmbed::new()
        .title("Server Icon")
        .image(icon)
        .color(INFO_COLOR);
    cmd.reply_embed(embed).await?;
    Ok(())
}

pub async fn ping(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let mut sent = cmd.reply("Pinging...").await?;
    let latency = sent.timestamp.timestamp_millis() - cmd.msg.timestamp.timestamp_millis();

    sent.edit(
        cmd.ctx,
        serenity::EditMessage::new().content(format!("Pong! Latency is {}ms.", latency)),
    )
    .await?;
    Ok(())
}
