use crate::core::leveling::{LevelUpEvent, XP_PER_LEVEL};
use crate::discord::Data;
use poise::serenity_prelude::{self as serenity, builder::CreateMessage};
use rand::seq::SliceRandom;

/// Announce a level-up in the channel where the triggering message was sent.
pub async fn send_level_up_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
    level_up: &LevelUpEvent,
) -> Result<(), serenity::Error> {
    let in_level = data.leveling.progress_in_level(level_up.total_xp);
    let progress = in_level as f64 / XP_PER_LEVEL as f64;

    let embed = serenity::CreateEmbed::new()
        .title("Level Up!")
        .description(format!(
            "{} has leveled up to level {}! 🎉",
            message.author.tag(),
            level_up.new_level
        ))
        .color(level_color(level_up.new_level))
        .field("Total XP", level_up.total_xp.to_string(), true)
        .field(
            "Progress",
            format!(
                "{}/{} XP\n{}",
                in_level,
                XP_PER_LEVEL,
                build_progress_bar(progress, 18)
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(random_flavor_line()));

    message
        .channel_id
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await
        .map(|_| ())
}

fn level_color(level: u32) -> serenity::Colour {
    if level >= 50 {
        serenity::Colour::DARK_PURPLE
    } else if level >= 25 {
        serenity::Colour::ORANGE
    } else if level >= 10 {
        serenity::Colour::GOLD
    } else if level >= 5 {
        serenity::Colour::BLURPLE
    } else {
        serenity::Colour::LIGHT_GREY
    }
}

pub fn build_progress_bar(progress: f64, length: usize) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let mut filled = (clamped * length as f64).round() as usize;
    if clamped > 0.0 && filled == 0 {
        filled = 1;
    }
    filled = filled.min(length);
    let bar = "▰".repeat(filled) + &"▱".repeat(length - filled);
    format!("{} ({}%)", bar, (clamped * 100.0).round() as u32)
}

fn random_flavor_line() -> &'static str {
    const FLAVOR_LINES: [&str; 4] = [
        "Keep chatting!",
        "Every message counts.",
        "Another level down.",
        "That XP bar never stood a chance.",
    ];

    FLAVOR_LINES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FLAVOR_LINES[0])
}
