// Bot presence. Set once when the gateway session is ready.

use poise::serenity_prelude as serenity;

/// Advertise that DMs are read (they get forwarded to the staff channel).
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("my DMs");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
