// Guild log commands - webhook setup and per-event toggles.

use crate::core::config::LoggingConfig;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::ChoiceParameter;
use secrecy::ExposeSecret;

/// A loggable event type, one per flag column.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum LogEventChoice {
    #[name = "Member join"]
    MemberJoin,
    #[name = "Member leave"]
    MemberLeave,
    #[name = "Member ban"]
    MemberBan,
    #[name = "Member unban"]
    MemberUnban,
    #[name = "Member rename"]
    MemberRename,
    #[name = "Member role change"]
    MemberRoleChange,
    #[name = "Message edit"]
    MessageEdit,
    #[name = "Message delete"]
    MessageDelete,
}

impl LogEventChoice {
    fn apply(self, config: &mut LoggingConfig, enabled: bool) {
        match self {
            LogEventChoice::MemberJoin => config.member_join = enabled,
            LogEventChoice::MemberLeave => config.member_leave = enabled,
            LogEventChoice::MemberBan => config.member_ban = enabled,
            LogEventChoice::MemberUnban => config.member_unban = enabled,
            LogEventChoice::MemberRename => config.member_rename = enabled,
            LogEventChoice::MemberRoleChange => config.member_role_change = enabled,
            LogEventChoice::MessageEdit => config.message_edit = enabled,
            LogEventChoice::MessageDelete => config.message_delete = enabled,
        }
    }
}

/// Configure guild logging.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("status", "setup", "disable", "event")
)]
pub async fn logging(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current logging configuration.
#[poise::command(slash_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let Some(config) = ctx.data().config.get_logging(guild_id).await? else {
        ctx.say("Logging has never been configured here. Use `/logging setup` first.")
            .await?;
        return Ok(());
    };

    let flags = [
        ("Member join", config.member_join),
        ("Member leave", config.member_leave),
        ("Member ban", config.member_ban),
        ("Member unban", config.member_unban),
        ("Member rename", config.member_rename),
        ("Member role change", config.member_role_change),
        ("Message edit", config.message_edit),
        ("Message delete", config.message_delete),
    ];

    let events = flags
        .iter()
        .map(|(name, on)| format!("{} {}", if *on { "✅" } else { "❌" }, name))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Logging configuration")
        .color(0xEB459E)
        .field("Active", if config.active { "yes" } else { "no" }, true)
        .field(
            "Channel",
            config
                .webhook_channel
                .map(|id| format!("<#{}>", id))
                .unwrap_or_else(|| "not set".to_string()),
            true,
        )
        .field("Events", events, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Create the log webhook in a channel and activate logging.
#[poise::command(slash_command)]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "Channel to log into"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let webhook = channel
        .id
        .create_webhook(
            ctx.http(),
            serenity::CreateWebhook::new("Palisade Logs"),
        )
        .await?;

    let token = webhook
        .token
        .clone()
        .ok_or("Discord did not return a webhook token")?;
    let webhook_id = webhook.id.get();
    let channel_id = channel.id.get();

    ctx.data()
        .config
        .update_logging(guild_id, |config| {
            config.active = true;
            config.webhook_id = Some(webhook_id);
            config.webhook_channel = Some(channel_id);
            config.webhook_token = Some(token.expose_secret().clone());
        })
        .await?;

    tracing::info!(guild_id, channel_id, "guild logging configured");
    ctx.say(format!(
        "Logging is active; events will be posted to <#{}>. Enable event types with `/logging event`.",
        channel.id
    ))
    .await?;
    Ok(())
}

/// Turn logging off (the webhook is kept).
#[poise::command(slash_command)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_logging(guild_id, |config| config.active = false)
        .await?;

    ctx.say("Logging **disabled**.").await?;
    Ok(())
}

/// Toggle a single event type.
#[poise::command(slash_command)]
pub async fn event(
    ctx: Context<'_>,
    #[description = "Event type"] event: LogEventChoice,
    #[description = "Log this event?"] enabled: bool,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_logging(guild_id, |config| event.apply(config, enabled))
        .await?;

    ctx.say(format!(
        "{} is now {}.",
        event.name(),
        if enabled { "logged" } else { "ignored" }
    ))
    .await?;
    Ok(())
}
