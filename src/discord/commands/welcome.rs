// Welcome commands - join/leave greetings and join roles.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Configure welcome and farewell messages.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands(
        "status",
        "enable",
        "disable",
        "join",
        "leave",
        "join_role_add",
        "join_role_remove"
    )
)]
pub async fn welcome(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current welcome configuration.
#[poise::command(slash_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let Some(config) = ctx.data().config.get_welcome(guild_id).await? else {
        ctx.say("Welcome messages have never been configured here.")
            .await?;
        return Ok(());
    };

    let channel = |id: Option<u64>| {
        id.map(|id| format!("<#{}>", id))
            .unwrap_or_else(|| "not set".to_string())
    };
    let toggled = |on: bool| if on { "on" } else { "off" };

    let join_roles = if config.join_roles.is_empty() {
        "none".to_string()
    } else {
        config
            .join_roles
            .iter()
            .map(|role| format!("<@&{}>", role))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let embed = serenity::CreateEmbed::new()
        .title("Welcome configuration")
        .color(0x57F287)
        .field("Module", toggled(config.active), true)
        .field(
            "Join",
            format!(
                "{} in {}",
                toggled(config.join_active),
                channel(config.join_channel)
            ),
            false,
        )
        .field(
            "Leave",
            format!(
                "{} in {}",
                toggled(config.leave_active),
                channel(config.leave_channel)
            ),
            false,
        )
        .field("Join roles", join_roles, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Turn the welcome module on.
#[poise::command(slash_command)]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_welcome(guild_id, |config| config.active = true)
        .await?;

    ctx.say("Welcome module **enabled**.").await?;
    Ok(())
}

/// Turn the welcome module off.
#[poise::command(slash_command)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_welcome(guild_id, |config| config.active = false)
        .await?;

    ctx.say("Welcome module **disabled**.").await?;
    Ok(())
}

/// Configure the join greeting. Placeholders: {user}, {guild}, {count}.
#[poise::command(slash_command)]
pub async fn join(
    ctx: Context<'_>,
    #[description = "Channel for join messages"] channel: serenity::GuildChannel,
    #[description = "Message template; omit for the default"]
    #[max_length = 2000]
    message: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let channel_id = channel.id.get();
    ctx.data()
        .config
        .update_welcome(guild_id, |config| {
            config.join_channel = Some(channel_id);
            config.join_message = message;
            config.join_active = true;
        })
        .await?;

    ctx.say(format!("Join messages will be sent to <#{}>.", channel.id))
        .await?;
    Ok(())
}

/// Configure the farewell message. Placeholders: {user}, {guild}.
#[poise::command(slash_command)]
pub async fn leave(
    ctx: Context<'_>,
    #[description = "Channel for leave messages"] channel: serenity::GuildChannel,
    #[description = "Message template; omit for the default"]
    #[max_length = 2000]
    message: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let channel_id = channel.id.get();
    ctx.data()
        .config
        .update_welcome(guild_id, |config| {
            config.leave_channel = Some(channel_id);
            config.leave_message = message;
            config.leave_active = true;
        })
        .await?;

    ctx.say(format!("Leave messages will be sent to <#{}>.", channel.id))
        .await?;
    Ok(())
}

/// Grant a role to every new member.
#[poise::command(slash_command)]
pub async fn join_role_add(
    ctx: Context<'_>,
    #[description = "Role to grant on join"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let role_id = role.id.get();
    ctx.data()
        .config
        .update_welcome(guild_id, |config| {
            if !config.join_roles.contains(&role_id) {
                config.join_roles.push(role_id);
            }
        })
        .await?;

    ctx.say(format!("New members will receive {}.", role.name))
        .await?;
    Ok(())
}

/// Stop granting a role on join.
#[poise::command(slash_command)]
pub async fn join_role_remove(
    ctx: Context<'_>,
    #[description = "Role to stop granting"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let role_id = role.id.get();
    ctx.data()
        .config
        .update_welcome(guild_id, |config| {
            config.join_roles.retain(|r| *r != role_id);
        })
        .await?;

    ctx.say(format!("{} is no longer granted on join.", role.name))
        .await?;
    Ok(())
}
