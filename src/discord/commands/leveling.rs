// Leveling commands.
//
// `rank` and `leaderboard` run behind the module gate; the `leveling`
// config group is for moderators and works even while the module is off
// (so it can be turned on in the first place).

use crate::core::leveling::xp_for_level;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Show a member's level and XP.
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::discord::checks::leveling_active"
)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    if target.bot {
        ctx.say("Bots don't gain XP. 🤖").await?;
        return Ok(());
    }

    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let (xp, level) = ctx.data().leveling.rank_of(guild_id, target.id.get()).await?;

    let current_threshold = xp_for_level(level);
    let next_threshold = xp_for_level(level + 1);
    let progress = xp.saturating_sub(current_threshold);
    let span = next_threshold.saturating_sub(current_threshold);
    let fraction = if span > 0 {
        progress as f64 / span as f64
    } else {
        0.0
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("Rank of {}", target.name))
        .color(0x5865F2)
        .thumbnail(target.face())
        .field("Level", format!("**{}**", level), true)
        .field("Total XP", format!("**{}**", xp), true)
        .field(
            "Progress",
            format!(
                "{}/{} XP\n{}",
                progress,
                span,
                build_progress_bar(fraction, 15)
            ),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the top 10 members by XP.
#[poise::command(
    slash_command,
    guild_only,
    check = "crate::discord::checks::leveling_active"
)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let top = ctx.data().leveling.leaderboard(guild_id, 10).await?;

    if top.is_empty() {
        ctx.say("Nobody has earned XP yet. Start chatting!").await?;
        return Ok(());
    }

    let mut lines = Vec::new();
    for (index, entry) in top.iter().enumerate() {
        let medal = match index {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "▫️",
        };
        lines.push(format!(
            "{} **{}.** <@{}> — {} XP",
            medal,
            index + 1,
            entry.user_id,
            entry.xp
        ));
    }

    let embed = serenity::CreateEmbed::new()
        .title("🏆 Leaderboard")
        .description(lines.join("\n"))
        .color(0xDAA520);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Configure the leveling module.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands(
        "status",
        "enable",
        "disable",
        "channel",
        "message",
        "reward_add",
        "reward_remove"
    )
)]
pub async fn leveling(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current leveling configuration.
#[poise::command(slash_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let config = ctx.data().config.get_leveling(guild_id).await?;

    let Some(config) = config else {
        ctx.say("Leveling has never been configured here. Use `/leveling enable` to start.")
            .await?;
        return Ok(());
    };

    let rewards = if config.roles.is_empty() {
        "none".to_string()
    } else {
        config
            .roles
            .iter()
            .map(|role| format!("<@&{}>", role))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let embed = serenity::CreateEmbed::new()
        .title("Leveling configuration")
        .color(0x5865F2)
        .field("Active", if config.active { "yes" } else { "no" }, true)
        .field(
            "Announcement channel",
            config
                .channel
                .map(|id| format!("<#{}>", id))
                .unwrap_or_else(|| "same channel".to_string()),
            true,
        )
        .field("Reward roles", rewards, false)
        .field(
            "Custom message",
            config.message.as_deref().unwrap_or("default"),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Turn the leveling module on.
#[poise::command(slash_command)]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_leveling(guild_id, |config| config.active = true)
        .await?;

    ctx.say("Leveling is now **enabled**.").await?;
    Ok(())
}

/// Turn the leveling module off.
#[poise::command(slash_command)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_leveling(guild_id, |config| config.active = false)
        .await?;

    ctx.say("Leveling is now **disabled**.").await?;
    Ok(())
}

/// Set (or clear) the level-up announcement channel.
#[poise::command(slash_command)]
pub async fn channel(
    ctx: Context<'_>,
    #[description = "Channel for announcements; omit to announce in place"] channel: Option<
        serenity::GuildChannel,
    >,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let channel_id = channel.as_ref().map(|c| c.id.get());
    ctx.data()
        .config
        .update_leveling(guild_id, |config| config.channel = channel_id)
        .await?;

    match channel {
        Some(channel) => {
            ctx.say(format!("Level-ups will be announced in <#{}>.", channel.id))
                .await?
        }
        None => {
            ctx.say("Level-ups will be announced where they happen.")
                .await?
        }
    };
    Ok(())
}

/// Set (or reset) the level-up message. Placeholders: {user}, {level}, {guild}.
#[poise::command(slash_command)]
pub async fn message(
    ctx: Context<'_>,
    #[description = "Message template; omit to reset to the default"]
    #[max_length = 2000]
    template: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let cleared = template.is_none();
    ctx.data()
        .config
        .update_leveling(guild_id, |config| config.message = template)
        .await?;

    if cleared {
        ctx.say("Level-up message reset to the default.").await?;
    } else {
        ctx.say("Level-up message updated.").await?;
    }
    Ok(())
}

/// Append a reward role. The n-th role unlocks at level 5 * n.
#[poise::command(slash_command)]
pub async fn reward_add(
    ctx: Context<'_>,
    #[description = "Role to grant"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let role_id = role.id.get();
    let config = ctx
        .data()
        .config
        .update_leveling(guild_id, |config| {
            if !config.roles.contains(&role_id) {
                config.roles.push(role_id);
            }
        })
        .await?;

    let position = config.roles.iter().position(|r| *r == role_id).unwrap_or(0) + 1;
    ctx.say(format!(
        "{} is now a reward role (unlocks at level {}).",
        role.name,
        position * 5
    ))
    .await?;
    Ok(())
}

/// Remove a reward role.
#[poise::command(slash_command)]
pub async fn reward_remove(
    ctx: Context<'_>,
    #[description = "Role to remove"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let role_id = role.id.get();
    ctx.data()
        .config
        .update_leveling(guild_id, |config| {
            config.roles.retain(|r| *r != role_id);
        })
        .await?;

    ctx.say(format!("{} is no longer a reward role.", role.name))
        .await?;
    Ok(())
}

/// Render a text progress bar like `███░░░░░░░`.
fn build_progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_is_clamped() {
        assert_eq!(build_progress_bar(0.0, 4), "░░░░");
        assert_eq!(build_progress_bar(0.5, 4), "██░░");
        assert_eq!(build_progress_bar(1.0, 4), "████");
        assert_eq!(build_progress_bar(7.3, 4), "████");
    }
}
