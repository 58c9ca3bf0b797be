// Moderation commands - automod rules and the surrounding guild settings.

use crate::core::config::{AutomodAction, AutomodCategory, AutomodFinalAction};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum CategoryChoice {
    Invites,
    Links,
    Mentions,
    Caps,
}

impl CategoryChoice {
    fn category(self) -> AutomodCategory {
        match self {
            CategoryChoice::Invites => AutomodCategory::Invite,
            CategoryChoice::Links => AutomodCategory::Link,
            CategoryChoice::Mentions => AutomodCategory::Mention,
            CategoryChoice::Caps => AutomodCategory::Caps,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ActionChoice {
    #[name = "No action"]
    None,
    Kick,
    Ban,
    #[name = "Temporary ban"]
    Tempban,
    #[name = "Temporary mute"]
    Tempmute,
    Mute,
}

impl ActionChoice {
    fn action(self) -> AutomodAction {
        match self {
            ActionChoice::None => AutomodAction::None,
            ActionChoice::Kick => AutomodAction::Kick,
            ActionChoice::Ban => AutomodAction::Ban,
            ActionChoice::Tempban => AutomodAction::Tempban,
            ActionChoice::Tempmute => AutomodAction::Tempmute,
            ActionChoice::Mute => AutomodAction::Mute,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum FinalActionChoice {
    #[name = "Only collect points"]
    Points,
    #[name = "No action"]
    None,
    Kick,
    Ban,
    #[name = "Temporary ban"]
    Tempban,
    #[name = "Temporary mute"]
    Tempmute,
    Mute,
}

impl FinalActionChoice {
    fn action(self) -> AutomodFinalAction {
        match self {
            FinalActionChoice::Points => AutomodFinalAction::Points,
            FinalActionChoice::None => AutomodFinalAction::None,
            FinalActionChoice::Kick => AutomodFinalAction::Kick,
            FinalActionChoice::Ban => AutomodFinalAction::Ban,
            FinalActionChoice::Tempban => AutomodFinalAction::Tempban,
            FinalActionChoice::Tempmute => AutomodFinalAction::Tempmute,
            FinalActionChoice::Mute => AutomodFinalAction::Mute,
        }
    }
}

/// Configure the automod.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands(
        "status",
        "enable",
        "disable",
        "action",
        "points",
        "escalation",
        "whitelist_channel",
        "mod_role",
        "mute_role",
        "log_channel"
    )
)]
pub async fn automod(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current automod configuration.
#[poise::command(slash_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let Some(config) = ctx.data().config.get_moderation(guild_id).await? else {
        ctx.say("The automod has never been configured here. Use `/automod enable` to start.")
            .await?;
        return Ok(());
    };

    let categories = [
        (AutomodCategory::Invite, &config.invite),
        (AutomodCategory::Link, &config.link),
        (AutomodCategory::Mention, &config.mention),
        (AutomodCategory::Caps, &config.caps),
    ];

    let rules = categories
        .iter()
        .map(|(category, rule)| {
            format!(
                "**{}** — action: {}, points: {}",
                category.display_name(),
                rule.action.as_str(),
                rule.points
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Automod configuration")
        .color(0xED4245)
        .field("Active", if config.active { "yes" } else { "no" }, true)
        .field("Escalation", config.automod_action.as_str(), true)
        .field(
            "Mute role",
            config
                .mute_role
                .map(|id| format!("<@&{}>", id))
                .unwrap_or_else(|| "not set".to_string()),
            true,
        )
        .field("Rules", rules, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Turn the automod on.
#[poise::command(slash_command)]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_moderation(guild_id, |config| config.active = true)
        .await?;

    ctx.say("Automod is now **enabled**.").await?;
    Ok(())
}

/// Turn the automod off.
#[poise::command(slash_command)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_moderation(guild_id, |config| config.active = false)
        .await?;

    ctx.say("Automod is now **disabled**.").await?;
    Ok(())
}

/// Set a category's action.
#[poise::command(slash_command)]
pub async fn action(
    ctx: Context<'_>,
    #[description = "Category to configure"] category: CategoryChoice,
    #[description = "Action on violation"] action: ActionChoice,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_moderation(guild_id, |config| {
            config.rule_mut(category.category()).action = action.action();
        })
        .await?;

    ctx.say(format!(
        "{} now trigger: {}.",
        category.category().display_name(),
        action.action().as_str()
    ))
    .await?;
    Ok(())
}

/// Set a category's point cost.
#[poise::command(slash_command)]
pub async fn points(
    ctx: Context<'_>,
    #[description = "Category to configure"] category: CategoryChoice,
    #[description = "Points per violation"]
    #[min = 1]
    #[max = 10]
    points: u16,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_moderation(guild_id, |config| {
            config.rule_mut(category.category()).points = points;
        })
        .await?;

    ctx.say(format!(
        "{} violations now cost {} point(s).",
        category.category().display_name(),
        points
    ))
    .await?;
    Ok(())
}

/// Set the action taken when a member's points run out.
#[poise::command(slash_command)]
pub async fn escalation(
    ctx: Context<'_>,
    #[description = "Final action"] action: FinalActionChoice,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    ctx.data()
        .config
        .update_moderation(guild_id, |config| {
            config.automod_action = action.action();
        })
        .await?;

    ctx.say(format!("Escalation action set to {}.", action.action().as_str()))
        .await?;
    Ok(())
}

/// Exempt a channel from one category.
#[poise::command(slash_command)]
pub async fn whitelist_channel(
    ctx: Context<'_>,
    #[description = "Category to exempt the channel from"] category: CategoryChoice,
    #[description = "Channel to exempt"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let channel_id = channel.id.get();
    ctx.data()
        .config
        .update_moderation(guild_id, |config| {
            let whitelist = &mut config.rule_mut(category.category()).whitelist_channels;
            if !whitelist.contains(&channel_id) {
                whitelist.push(channel_id);
            }
        })
        .await?;

    ctx.say(format!(
        "<#{}> is now exempt from the {} rule.",
        channel.id,
        category.category().display_name()
    ))
    .await?;
    Ok(())
}

/// Mark a role as moderator; its members bypass the automod.
#[poise::command(slash_command)]
pub async fn mod_role(
    ctx: Context<'_>,
    #[description = "Role to mark as moderator"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let role_id = role.id.get();
    ctx.data()
        .config
        .update_moderation(guild_id, |config| {
            if !config.mod_roles.contains(&role_id) {
                config.mod_roles.push(role_id);
            }
        })
        .await?;

    ctx.say(format!("{} is now a moderator role.", role.name))
        .await?;
    Ok(())
}

/// Set the role applied by mute actions.
#[poise::command(slash_command)]
pub async fn mute_role(
    ctx: Context<'_>,
    #[description = "Mute role"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let role_id = role.id.get();
    ctx.data()
        .config
        .update_moderation(guild_id, |config| config.mute_role = Some(role_id))
        .await?;

    ctx.say(format!("Mute role set to {}.", role.name)).await?;
    Ok(())
}

/// Set the channel automod reports are posted to.
#[poise::command(slash_command)]
pub async fn log_channel(
    ctx: Context<'_>,
    #[description = "Report channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let channel_id = channel.id.get();
    ctx.data()
        .config
        .update_moderation(guild_id, |config| config.log_channel = Some(channel_id))
        .await?;

    ctx.say(format!("Automod reports will go to <#{}>.", channel.id))
        .await?;
    Ok(())
}
