// Message-create pipeline.
//
// Stages run in a fixed order:
// 1. Forward DMs from humans to the staff channel
// 2. Track monitored-channel messages for ghost-ping detection, bots included
// 3. Stop on bot authors
// 4. Award XP, remembering whether the user leveled up
// 5. Snapshot the message for `stalk`
// 6. Dispatch a prefix command
// 7. Announce the level-up from stage 4
//
// A failing stage is logged and the next one still runs.

use crate::core::leveling::LevelUpEvent;
use crate::discord::commands::dispatch_command;
use crate::discord::leveling_announcements::send_level_up_message;
use crate::discord::logging::events::{forward_direct_message, track_monitored_message};
use crate::discord::Data;
use poise::serenity_prelude as serenity;

/// Whether a message should earn XP. Command messages count unless disabled.
pub fn earns_xp(content: &str, prefix: &str, xp_for_commands: bool) -> bool {
    xp_for_commands || !content.starts_with(prefix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ForwardDm,
    TrackMonitored,
    AwardXp,
    LogMessage,
    Dispatch,
    AnnounceLevelUp,
}

/// The stages a message goes through, in order.
fn stages(is_direct: bool, author_is_bot: bool) -> Vec<Stage> {
    let mut stages = Vec::with_capacity(6);
    if is_direct && !author_is_bot {
        stages.push(Stage::ForwardDm);
    }
    // Bot messages can ghost ping too, so tracking comes before the bot cut-off.
    stages.push(Stage::TrackMonitored);
    if author_is_bot {
        return stages;
    }
    stages.extend([
        Stage::AwardXp,
        Stage::LogMessage,
        Stage::Dispatch,
        Stage::AnnounceLevelUp,
    ]);
    stages
}

pub async fn handle_message(ctx: &serenity::Context, data: &Data, message: &serenity::Message) {
    let mut level_up = None;

    for stage in stages(message.guild_id.is_none(), message.author.bot) {
        match stage {
            Stage::ForwardDm => {
                if let Err(e) = forward_direct_message(ctx, data, message).await {
                    tracing::warn!("Failed to forward DM: {}", e);
                }
            }
            Stage::TrackMonitored => track_monitored_message(data, message),
            Stage::AwardXp => level_up = award_xp(data, message).await,
            Stage::LogMessage => log_message(data, message).await,
            // Catches its own failures
            Stage::Dispatch => dispatch_command(ctx, data, message).await,
            Stage::AnnounceLevelUp => {
                if let Some(level_up) = level_up.take() {
                    if let Err(e) = send_level_up_message(ctx, message, data, &level_up).await {
                        tracing::warn!("Failed to send level-up message: {}", e);
                    }
                }
            }
        }
    }
}

async fn log_message(data: &Data, message: &serenity::Message) {
    let author_id = message.author.id.get();
    if let Err(e) = data
        .message_log
        .remember_message(
            message.id.get(),
            message.channel_id.get(),
            author_id,
            &message.content,
        )
        .await
    {
        tracing::error!(user_id = author_id, "Failed to log message: {}", e);
    }
}

async fn award_xp(data: &Data, message: &serenity::Message) -> Option<LevelUpEvent> {
    if !earns_xp(&message.content, &data.config.prefix, data.config.xp_for_commands) {
        return None;
    }

    match data.leveling.process_message(message.author.id.get()).await {
        Ok(Some(level_up)) => {
            tracing::info!(
                user_id = level_up.user_id,
                old_level = level_up.old_level,
                new_level = level_up.new_level,
                total_xp = level_up.total_xp,
                "User leveled up"
            );
            Some(level_up)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::error!(
                user_id = message.author.id.get(),
                "Error processing XP for message: {}",
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_always_earn_xp() {
        assert!(earns_xp("hello", "!", true));
        assert!(earns_xp("hello", "!", false));
    }

    #[test]
    fn bot_messages_are_tracked_then_dropped() {
        assert_eq!(stages(false, true), vec![Stage::TrackMonitored]);
        assert_eq!(stages(true, true), vec![Stage::TrackMonitored]);
    }

    #[test]
    fn human_messages_run_every_stage_in_order() {
        assert_eq!(
            stages(false, false),
            vec![
                Stage::TrackMonitored,
                Stage::AwardXp,
                Stage::LogMessage,
                Stage::Dispatch,
                Stage::AnnounceLevelUp,
            ]
        );
        assert_eq!(stages(true, false).first(), Some(&Stage::ForwardDm));
        assert_eq!(stages(true, false).len(), 6);
    }

    #[test]
    fn command_messages_follow_the_switch() {
        assert!(earns_xp("!rank", "!", true));
        assert!(!earns_xp("!rank", "!", false));
    }
}
