// Command pre-execution checks bridging the guard service into poise.
//
// A failing check raises a GuardError; the on_error handler in main.rs
// renders it as an ephemeral reply.

use crate::core::guards::Module;
use crate::discord::{Context, Error, DEFAULT_LOCALE};

/// Only the configured bot owner may proceed.
pub async fn owner_only(ctx: Context<'_>) -> Result<bool, Error> {
    ctx.data().guards.check_owner(ctx.author().id.get())?;
    Ok(true)
}

/// The leveling module must be active for the invoking guild.
pub async fn leveling_active(ctx: Context<'_>) -> Result<bool, Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let locale = ctx.locale().unwrap_or(DEFAULT_LOCALE);

    ctx.data()
        .guards
        .check_module(guild_id, locale, Module::Leveling)
        .await?;

    Ok(true)
}
