// Message XP adapter: feeds messages into the leveling service and turns
// level-up events into announcements and reward roles.

use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};

use super::render_template;
use crate::core::leveling::{unlocked_rewards, LevelUpEvent, XpOutcome};
use crate::discord::{Data, DEFAULT_LOCALE};

pub async fn handle_message(
    ctx: &Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<()> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let author_roles: Vec<u64> = message
        .member
        .as_deref()
        .map(|member| member.roles.iter().map(|role| role.get()).collect())
        .unwrap_or_default();

    let outcome = data
        .leveling
        .process_message(
            guild_id.get(),
            message.author.id.get(),
            message.channel_id.get(),
            &author_roles,
        )
        .await?;

    if let XpOutcome::LevelUp(event) = outcome {
        tracing::info!(
            guild_id = event.guild_id,
            user_id = event.user_id,
            level = event.new_level,
            "member leveled up"
        );

        if let Err(error) = announce(ctx, data, message, &event).await {
            tracing::warn!("failed to announce level up: {error}");
        }
        if let Err(error) =
            grant_rewards(ctx, data, guild_id, message.author.id, event.new_level).await
        {
            tracing::warn!("failed to grant reward roles: {error}");
        }
    }

    Ok(())
}

async fn announce(
    ctx: &Context,
    data: &Data,
    message: &serenity::Message,
    event: &LevelUpEvent,
) -> Result<()> {
    let Some(config) = data.config.get_leveling(event.guild_id).await? else {
        return Ok(());
    };

    // Cache guards are not Send; copy what we need before awaiting.
    let (locale, guild_name) = match ctx.cache.guild(serenity::GuildId::new(event.guild_id)) {
        Some(guild) => (guild.preferred_locale.to_string(), guild.name.clone()),
        None => (DEFAULT_LOCALE.to_string(), String::new()),
    };

    let mention = format!("<@{}>", event.user_id);
    let level = event.new_level.to_string();
    let params = [
        ("user", mention.as_str()),
        ("level", level.as_str()),
        ("guild", guild_name.as_str()),
    ];

    let text = match &config.message {
        Some(template) => render_template(template, &params),
        None => data.locales.translate(&locale, "leveling.level_up", &params),
    };

    let channel = config
        .channel
        .map(serenity::ChannelId::new)
        .unwrap_or(message.channel_id);
    channel.say(&ctx.http, text).await?;

    Ok(())
}

/// Grant the newest unlocked reward role; drop older ones when the guild
/// opted into `remove_roles`.
async fn grant_rewards(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    level: u32,
) -> Result<()> {
    let Some(config) = data.config.get_leveling(guild_id.get()).await? else {
        return Ok(());
    };

    let unlocked = unlocked_rewards(&config.roles, level);
    let Some((&newest, older)) = unlocked.split_last() else {
        return Ok(());
    };

    let member = ctx.http.get_member(guild_id, user_id).await?;
    member
        .add_role(&ctx.http, serenity::RoleId::new(newest))
        .await?;

    if config.remove_roles {
        for &role in older {
            let role = serenity::RoleId::new(role);
            if member.roles.contains(&role) {
                member.remove_role(&ctx.http, role).await?;
            }
        }
    }

    Ok(())
}
