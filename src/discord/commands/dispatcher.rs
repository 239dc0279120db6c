// Prefix command dispatch.
//
// 1. Parse `!name args...` from the message
// 2. Resolve the name against the static registry with the caller's permissions
// 3. Run the handler, catching any failure at this boundary
//
// Nothing here returns an error to the event reactor: failures are logged and
// the caller gets a generic reply.

use super::{help, info, leveling, moderation};
use crate::core::commands::{parse_command, ActorPermissions, CommandKind, DenialPolicy, Resolution};
use crate::discord::logging::commands as logging_commands;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

const GENERIC_FAILURE: &str = "There was an error while executing this command.";

/// Everything a command handler gets to work with.
pub struct CommandContext<'a> {
    pub ctx: &'a serenity::Context,
    pub data: &'a Data,
    pub msg: &'a serenity::Message,
    pub args: &'a [String],
}

impl<'a> CommandContext<'a> {
    pub async fn reply(&self, content: impl Into<String>) -> Result<serenity::Message, Error> {
        Ok(self.msg.reply(&self.ctx.http, content.into()).await?)
    }

    pub async fn reply_embed(&self, embed: serenity::CreateEmbed) -> Result<serenity::Message, Error> {
        let message = serenity::CreateMessage::new()
            .embed(embed)
            .reference_message(self.msg);
        Ok(self.msg.channel_id.send_message(&self.ctx.http, message).await?)
    }

    /// The guild the command ran in. Replies and returns `None` in DMs.
    pub async fn require_guild(&self) -> Result<Option<serenity::GuildId>, Error> {
        match self.msg.guild_id {
            Some(id) => Ok(Some(id)),
            None => {
                self.reply("This command only works in servers.").await?;
                Ok(None)
            }
        }
    }

    pub fn first_mention(&self) -> Option<&'a serenity::User> {
        self.msg.mentions.first()
    }

    /// First mentioned user, falling back to the caller.
    pub fn target_or_author(&self) -> &'a serenity::User {
        self.first_mention().unwrap_or(&self.msg.author)
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(String::as_str)
    }

    /// Resolve a guild member, `None` when the user isn't in the guild.
    pub async fn member(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Option<serenity::Member> {
        match guild_id.member(self.ctx, user_id).await {
            Ok(member) => Some(member),
            Err(e) => {
                tracing::debug!(user_id = user_id.get(), "Member lookup failed: {}", e);
                None
            }
        }
    }

    /// Find a role by exact name in the cached guild.
    pub fn role_named(&self, guild_id: serenity::GuildId, name: &str) -> Option<serenity::RoleId> {
        let guild = self.ctx.cache.guild(guild_id)?;
        let role_id = guild.roles.values().find(|r| r.name == name).map(|r| r.id);
        role_id
    }
}

/// Handle a message that might be a command. Never fails.
pub async fn dispatch_command(ctx: &serenity::Context, data: &Data, msg: &serenity::Message) {
    let Some(parsed) = parse_command(&msg.content, &data.config.prefix) else {
        return;
    };

    let actor = actor_permissions(ctx, msg);
    let kind = match data.commands.resolve(&parsed.name, actor) {
        Resolution::Unknown => return,
        Resolution::Denied(DenialPolicy::Silent) => {
            tracing::debug!(
                command = %parsed.name,
                user_id = msg.author.id.get(),
                "Ignoring command from user without permission"
            );
            return;
        }
        Resolution::Denied(DenialPolicy::Reply(text)) => {
            if let Err(e) = msg.reply(&ctx.http, text).await {
                tracing::warn!("Failed to send permission denial: {}", e);
            }
            return;
        }
        Resolution::Allowed(kind) => kind,
    };

    let command = CommandContext {
        ctx,
        data,
        msg,
        args: &parsed.args,
    };

    if let Err(e) = run_command(kind, &command).await {
        tracing::error!(
            command = %parsed.name,
            user_id = msg.author.id.get(),
            "Error executing command: {}",
            e
        );
        if let Err(e) = msg.reply(&ctx.http, GENERIC_FAILURE).await {
            tracing::warn!("Failed to send command failure reply: {}", e);
        }
    }
}

async fn run_command(kind: CommandKind, cmd: &CommandContext<'_>) -> Result<(), Error> {
    match kind {
        CommandKind::Ban => moderation::ban(cmd).await,
        CommandKind::Mute => moderation::mute(cmd).await,
        CommandKind::Unmute => moderation::unmute(cmd).await,
        CommandKind::Unban => moderation::unban(cmd).await,
        CommandKind::Warn => moderation::warn(cmd).await,
        CommandKind::AddRole => moderation::addrole(cmd).await,
        CommandKind::Purge => moderation::purge(cmd).await,
        CommandKind::ServerInfo => info::serverinfo(cmd).await,
        CommandKind::Mods => info::mods(cmd).await,
        CommandKind::UserInfo => info::userinfo(cmd).await,
        CommandKind::Dp => info::dp(cmd).await,
        CommandKind::ServerDp => info::serverdp(cmd).await,
        CommandKind::Ping => info::ping(cmd).await,
        CommandKind::Stalk => logging_commands::stalk(cmd).await,
        CommandKind::Rank => leveling::rank(cmd).await,
        CommandKind::Leaderboard => leveling::leaderboard(cmd).await,
        CommandKind::Help => help::help(cmd).await,
    }
}

/// Work out the caller's relevant permission bits from the cached guild.
/// DMs and uncached guilds yield no permissions.
fn actor_permissions(ctx: &serenity::Context, msg: &serenity::Message) -> ActorPermissions {
    let Some(guild_id) = msg.guild_id else {
        return ActorPermissions::default();
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return ActorPermissions::default();
    };

    if guild.owner_id == msg.author.id {
        return ActorPermissions {
            administrator: true,
            manage_messages: true,
        };
    }

    let member_roles: Vec<serenity::RoleId> = match (&msg.member, guild.members.get(&msg.author.id)) {
        (Some(partial), _) => partial.roles.clone(),
        (None, Some(member)) => member.roles.clone(),
        (None, None) => Vec::new(),
    };

    // @everyone shares the guild's id
    let everyone = serenity::RoleId::new(guild_id.get());
    let permissions = std::iter::once(&everyone)
        .chain(member_roles.iter())
        .filter_map(|id| guild.roles.get(id))
        .fold(serenity::Permissions::empty(), |acc, role| acc | role.permissions);

    ActorPermissions {
        administrator: permissions.administrator(),
        manage_messages: permissions.manage_messages(),
    }
}
