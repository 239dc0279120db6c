use crate::config::BotConfig;
use crate::core::logging::{DeletedMessageRecord, GhostPing};
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Discord rejects embeds whose field values exceed this many characters.
pub const EMBED_FIELD_LIMIT: usize = 1024;
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Clamp `text` to `limit` characters, ending in `…` when cut.
pub fn truncate_field(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn ghost_ping_embed(ping: &GhostPing) -> CreateEmbed {
    CreateEmbed::default()
        .title("👻 Ghost Ping Detected!")
        .description(truncate_field(
            &format!(
                "{} deleted a message that mentioned {}.",
                ping.author_tag,
                ping.mention_list()
            ),
            EMBED_DESCRIPTION_LIMIT,
        ))
        .color(serenity::Color::RED)
        .field("Channel", format!("<#{}>", ping.channel_id), true)
        .field("Time", ping.detected_at.format(TIME_FORMAT).to_string(), true)
        .timestamp(serenity::Timestamp::now())
}

pub fn dm_forward_embed(author: &serenity::User, content: &str) -> CreateEmbed {
    let content = if content.is_empty() { "No content" } else { content };

    CreateEmbed::default()
        .title("New DM Received")
        .color(serenity::Color::BLUE)
        .field("User", format!("{} ({})", author.tag(), author.id), false)
        .field("Content", truncate_field(content, EMBED_FIELD_LIMIT), false)
        .thumbnail(author.face())
        .timestamp(serenity::Timestamp::now())
}

pub fn welcome_embed(guild_name: &str, user: &serenity::User, config: &BotConfig) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(format!("Welcome to {}, {}!", guild_name, user.name))
        .description(config.welcome_description.as_str())
        .color(serenity::Color::from_rgb(0, 153, 255))
        .thumbnail(user.face())
        .footer(CreateEmbedFooter::new(format!("Welcome, {}!", user.tag())))
        .timestamp(serenity::Timestamp::now());

    if let Some(image) = &config.welcome_image_url {
        embed = embed.image(image);
    }
    embed
}

pub fn stalk_embed(record: &DeletedMessageRecord) -> CreateEmbed {
    CreateEmbed::default()
        .title("Last Deleted Message")
        .description(format!("Content: {}", record.content))
        .color(serenity::Color::ORANGE)
        .field("Channel", format!("<#{}>", record.channel_id), true)
        .field("Author", format!("<@{}>", record.author_id), true)
        .field(
            "Deleted At",
            record.recorded_at.format(TIME_FORMAT).to_string(),
            false,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_passes_through() {
        assert_eq!(truncate_field("hello", EMBED_FIELD_LIMIT), "hello");
        assert_eq!(truncate_field("", EMBED_FIELD_LIMIT), "");
    }

    #[test]
    fn full_length_dm_fits_a_field() {
        // A nitro DM can carry 4000 characters.
        let dm = "a".repeat(4000);
        let clamped = truncate_field(&dm, EMBED_FIELD_LIMIT);

        assert_eq!(clamped.chars().count(), EMBED_FIELD_LIMIT);
        assert!(clamped.ends_with('…'));
    }

    #[test]
    fn multibyte_text_is_cut_on_a_char_boundary() {
        let roles = "Modérateur, ".repeat(200);
        let clamped = truncate_field(&roles, EMBED_FIELD_LIMIT);

        assert_eq!(clamped.chars().count(), EMBED_FIELD_LIMIT);
        assert!(clamped.starts_with("Modérateur, Modérateur"));
    }

    #[test]
    fn exact_limit_is_untouched() {
        let text = "é".repeat(EMBED_FIELD_LIMIT);
        assert_eq!(truncate_field(&text, EMBED_FIELD_LIMIT), text);
    }
}
