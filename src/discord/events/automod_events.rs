// Automod adapter: extracts message facts, executes the resulting
// actions, and reports to the guild's automod log channel.

use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::automod::{MessageFacts, Violation};
use crate::core::config::{AutomodAction, AutomodFinalAction, ModerationConfig};
use crate::discord::Data;

/// Discord caps timeouts at 28 days.
const MAX_TIMEOUT_SECS: u64 = 28 * 86400;

/// What a configured action means in Discord terms.
enum Punishment {
    Nothing,
    Kick,
    Ban,
    Timeout,
}

impl Punishment {
    fn of(action: AutomodAction) -> Self {
        match action {
            AutomodAction::None => Punishment::Nothing,
            AutomodAction::Kick => Punishment::Kick,
            // No scheduler: a temporary ban degrades to a ban.
            AutomodAction::Ban | AutomodAction::Tempban => Punishment::Ban,
            AutomodAction::Mute | AutomodAction::Tempmute => Punishment::Timeout,
        }
    }

    fn of_final(action: AutomodFinalAction) -> Self {
        match action {
            AutomodFinalAction::Points | AutomodFinalAction::None => Punishment::Nothing,
            AutomodFinalAction::Kick => Punishment::Kick,
            AutomodFinalAction::Ban | AutomodFinalAction::Tempban => Punishment::Ban,
            AutomodFinalAction::Mute | AutomodFinalAction::Tempmute => Punishment::Timeout,
        }
    }
}

/// Check one message. Returns true when the message was acted on (the
/// caller then skips XP processing).
pub async fn handle_message(
    ctx: &Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<bool> {
    let Some(guild_id) = message.guild_id else {
        return Ok(false);
    };

    let Some(config) = data.config.get_moderation(guild_id.get()).await? else {
        return Ok(false);
    };

    let facts = MessageFacts {
        guild_id: guild_id.get(),
        user_id: message.author.id.get(),
        channel_id: message.channel_id.get(),
        author_roles: message
            .member
            .as_deref()
            .map(|member| member.roles.iter().map(|role| role.get()).collect())
            .unwrap_or_default(),
        content: message.content.clone(),
        user_mentions: message.mentions.len() as u32,
        role_mentions: message.mention_roles.len() as u32,
        mentions_everyone: message.mention_everyone,
    };

    let Some(violation) = data.automod.check_message(&facts, &config) else {
        return Ok(false);
    };

    tracing::info!(
        guild_id = facts.guild_id,
        user_id = facts.user_id,
        category = violation.category.display_name(),
        action = violation.action.as_str(),
        "automod violation"
    );

    if let Err(error) = message.delete(&ctx.http).await {
        tracing::warn!("failed to delete flagged message: {error}");
    }

    if config.notify_user {
        let notice = format!(
            "Your message in **{}** was removed: {}.",
            guild_name(ctx, guild_id),
            violation.reason
        );
        if let Err(error) = message
            .author
            .dm(&ctx.http, serenity::CreateMessage::new().content(notice))
            .await
        {
            tracing::debug!("could not DM automod notice: {error}");
        }
    }

    apply(
        ctx,
        &config,
        guild_id,
        message.author.id,
        Punishment::of(violation.action),
        &violation.reason,
    )
    .await?;

    let escalation =
        data.automod
            .register_violation(facts.guild_id, facts.user_id, &violation, &config);

    if let Some(escalation) = escalation {
        tracing::info!(
            guild_id = facts.guild_id,
            user_id = facts.user_id,
            total_points = escalation.total_points,
            "automod escalation"
        );
        apply(
            ctx,
            &config,
            guild_id,
            message.author.id,
            Punishment::of_final(escalation.action),
            "too many automod violations",
        )
        .await?;
    }

    if let Err(error) = report(ctx, &config, message, &violation).await {
        tracing::warn!("failed to post automod report: {error}");
    }

    Ok(true)
}

async fn apply(
    ctx: &Context,
    config: &ModerationConfig,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    punishment: Punishment,
    reason: &str,
) -> Result<()> {
    match punishment {
        Punishment::Nothing => {}
        Punishment::Kick => {
            guild_id
                .kick_with_reason(&ctx.http, user_id, reason)
                .await?;
        }
        Punishment::Ban => {
            guild_id
                .ban_with_reason(&ctx.http, user_id, 0, reason)
                .await?;
        }
        Punishment::Timeout => {
            let seconds = (config.mute_time as u64).min(MAX_TIMEOUT_SECS);
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            let until = serenity::Timestamp::from_unix_timestamp((now + seconds) as i64)?;

            guild_id
                .edit_member(
                    &ctx.http,
                    user_id,
                    serenity::EditMember::new().disable_communication_until_datetime(until),
                )
                .await?;
        }
    }

    Ok(())
}

async fn report(
    ctx: &Context,
    config: &ModerationConfig,
    message: &serenity::Message,
    violation: &Violation,
) -> Result<()> {
    let Some(channel) = config.log_channel else {
        return Ok(());
    };

    let embed = serenity::CreateEmbed::new()
        .title("Automod")
        .color(0xED4245)
        .field("Member", format!("<@{}>", message.author.id), true)
        .field("Category", violation.category.display_name(), true)
        .field("Action", violation.action.as_str(), true)
        .field("Reason", violation.reason.clone(), false)
        .field("Channel", format!("<#{}>", message.channel_id), true)
        .field("Points", violation.points.to_string(), true);

    serenity::ChannelId::new(channel)
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await?;

    Ok(())
}

fn guild_name(ctx: &Context, guild_id: serenity::GuildId) -> String {
    ctx.cache
        .guild(guild_id)
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_string())
}
