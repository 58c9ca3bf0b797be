// Welcome adapter: greets joining members, grants join roles, and says
// goodbye on leave.

use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context, Mentionable};

use super::render_template;
use crate::discord::{Data, DEFAULT_LOCALE};

pub async fn handle_member_join(
    ctx: &Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<()> {
    let guild_id = member.guild_id.get();

    let Some(config) = data.config.get_welcome(guild_id).await? else {
        return Ok(());
    };
    if !config.active || !config.join_active {
        return Ok(());
    }

    for &role in &config.join_roles {
        if let Err(error) = member
            .add_role(&ctx.http, serenity::RoleId::new(role))
            .await
        {
            tracing::warn!(guild_id, role, "failed to grant join role: {error}");
        }
    }

    let Some(channel) = config.join_channel else {
        return Ok(());
    };

    let (locale, guild_name, member_count) = guild_details(ctx, member.guild_id);
    let mention = member.mention().to_string();
    let count = member_count.to_string();
    let params = [
        ("user", mention.as_str()),
        ("guild", guild_name.as_str()),
        ("count", count.as_str()),
    ];

    let text = match &config.join_message {
        Some(template) => render_template(template, &params),
        None => data
            .locales
            .translate(&locale, "welcome.default_join", &params),
    };

    serenity::ChannelId::new(channel).say(&ctx.http, text).await?;
    Ok(())
}

pub async fn handle_member_leave(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let Some(config) = data.config.get_welcome(guild_id.get()).await? else {
        return Ok(());
    };
    if !config.active || !config.leave_active {
        return Ok(());
    }

    let Some(channel) = config.leave_channel else {
        return Ok(());
    };

    let (locale, guild_name, _) = guild_details(ctx, guild_id);
    let params = [("user", user.name.as_str()), ("guild", guild_name.as_str())];

    let text = match &config.leave_message {
        Some(template) => render_template(template, &params),
        None => data
            .locales
            .translate(&locale, "welcome.default_leave", &params),
    };

    serenity::ChannelId::new(channel).say(&ctx.http, text).await?;
    Ok(())
}

/// Cache guards are not Send; copy what we need in one scope.
fn guild_details(ctx: &Context, guild_id: serenity::GuildId) -> (String, String, u64) {
    match ctx.cache.guild(guild_id) {
        Some(guild) => (
            guild.preferred_locale.to_string(),
            guild.name.clone(),
            guild.member_count,
        ),
        None => (DEFAULT_LOCALE.to_string(), String::new(), 0),
    }
}
