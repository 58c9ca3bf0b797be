// Owner-only maintenance commands, gated by the owner guard.

use crate::discord::{Context, Error};
use tracing::info;

/// Drop every cached guild configuration (owner only).
#[poise::command(
    slash_command,
    check = "crate::discord::checks::owner_only",
    hide_in_help
)]
pub async fn reload(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().config.clear_cache();
    info!(user = %ctx.author().name, "configuration cache cleared");
    ctx.say("♻️ Configuration cache cleared.").await?;
    Ok(())
}

/// Shut down the bot (owner only).
#[poise::command(
    slash_command,
    check = "crate::discord::checks::owner_only",
    hide_in_help
)]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), Error> {
    info!("Shutdown command received from owner: {}", ctx.author().name);
    ctx.say("👋 Shutting down...").await?;
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}
