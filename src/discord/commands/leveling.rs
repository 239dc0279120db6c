// Discord commands for the XP ledger.
//
// **Notice the pattern:**
// 1. Extract primitive ids from Discord types
// 2. Call the core service
// 3. Format the response based on the result

use super::dispatcher::CommandContext;
use crate::core::leveling::XP_PER_LEVEL;
use crate::discord::leveling_announcements::build_progress_bar;
use crate::discord::Error;
use poise::serenity_prelude as serenity;

const RANK_COLOR: u32 = 0x0099ff;

/// Show the XP and level of the mentioned user, or the caller.
pub async fn rank(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let user = cmd.target_or_author();
    let Some(record) = cmd.data.leveling.get_record(user.id.get()).await? else {
        cmd.reply("User has no XP recorded.").await?;
        return Ok(());
    };

    let in_level = cmd.data.leveling.progress_in_level(record.xp);
    let progress = in_level as f64 / XP_PER_LEVEL as f64;

    let embed = serenity::CreateEmbed::new()
        .title(format!("{}'s Rank 🏆", user.tag()))
        .thumbnail(user.face())
        .color(RANK_COLOR)
        .field("XP", record.xp.to_string(), true)
        .field("Level", record.level.to_string(), true)
        .field(
            "Progress",
            format!(
                "{}/{} XP\n{}",
                in_level,
                XP_PER_LEVEL,
                build_progress_bar(progress, 15)
            ),
            false,
        );

    cmd.reply_embed(embed).await?;
    Ok(())
}

/// Top users by XP.
pub async fn leaderboard(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let records = cmd.data.leveling.leaderboard().await?;
    if records.is_empty() {
        cmd.reply("No XP has been recorded yet.").await?;
        return Ok(());
    }

    let lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. <@{}> - Level: {}, XP: {}", i + 1, r.user_id, r.level, r.xp))
        .collect();

    let embed = serenity::CreateEmbed::new()
        .title("Leaderboard")
        .description(lines.join("\n"))
        .color(RANK_COLOR);

    cmd.reply_embed(embed).await?;
    Ok(())
}
