// `help` is generated from the command registry, so the listing can't drift
// from what the dispatcher actually accepts.

use super::dispatcher::CommandContext;
use crate::core::commands::{Category, CommandRegistry, CommandSpec, Permission};
use crate::discord::Error;
use poise::serenity_prelude as serenity;

const HELP_COLOR: u32 = 0x0099ff;

/// One embed field per non-empty category: `(title, "`!name` - description" lines)`.
pub fn category_fields(registry: &CommandRegistry, prefix: &str) -> Vec<(&'static str, String)> {
    Category::ALL
        .iter()
        .filter_map(|category| {
            let lines: Vec<String> = registry
                .in_category(*category)
                .map(|spec| format!("`{}{}` - {}", prefix, spec.name, spec.description))
                .collect();
            (!lines.is_empty()).then(|| (category.title(), lines.join("\n")))
        })
        .collect()
}

fn permission_label(permission: Permission) -> &'static str {
    match permission {
        Permission::Everyone => "Everyone",
        Permission::Administrator => "Administrator",
        Permission::ManageMessages => "Manage Messages",
    }
}

fn command_embed(spec: &CommandSpec, prefix: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(format!("📜 {}{}", prefix, spec.name))
        .description(spec.description)
        .color(HELP_COLOR)
        .field("Usage", format!("`{}{}`", prefix, spec.usage), false)
        .field("Category", spec.category.title(), true)
        .field("Permission", permission_label(spec.permission), true)
}

pub async fn help(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let prefix = &cmd.data.config.prefix;

    if let Some(name) = cmd.arg(0) {
        let name = name.trim_start_matches(prefix.as_str());
        match cmd.data.commands.lookup(name) {
            Some(spec) => {
                cmd.reply_embed(command_embed(spec, prefix)).await?;
            }
            None => {
                cmd.reply(format!("Unknown command `{}`.", name)).await?;
            }
        }
        return Ok(());
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("📜 Help Command")
        .description("Here is a list of all available commands:")
        .color(HELP_COLOR)
        .timestamp(serenity::Timestamp::now());

    for (title, value) in category_fields(&cmd.data.commands, prefix) {
        embed = embed.field(title, value, false);
    }

    embed = embed
        .field(
            "Usage",
            format!(
                "Use `{0}command` to run a command, or `{0}help <command>` for details.",
                prefix
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new("Use these commands responsibly."));

    cmd.reply_embed(embed).await?;
    Ok(())
}
