use crate::discord::commands::CommandContext;
use crate::discord::logging::formatter::stalk_embed;
use crate::discord::Error;

const NOTHING_FOUND: &str = "No messages found for this user.";

/// Show the most recent logged message of a user, by raw user id.
pub async fn stalk(cmd: &CommandContext<'_>) -> Result<(), Error> {
    let Some(raw_id) = cmd.arg(0) else {
        cmd.reply("Please provide the ID of the user.").await?;
        return Ok(());
    };

    // A non-numeric id can't match any author
    let Ok(author_id) = raw_id.parse::<u64>() else {
        cmd.reply(NOTHING_FOUND).await?;
        return Ok(());
    };

    match cmd.data.message_log.latest_for_author(author_id).await? {
        Some(record) => {
            cmd.reply_embed(stalk_embed(&record)).await?;
        }
        None => {
            cmd.reply(NOTHING_FOUND).await?;
        }
    }
    Ok(())
}
