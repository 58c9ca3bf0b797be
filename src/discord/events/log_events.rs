// Guild log adapter: turns gateway events into embeds delivered through
// the guild's configured webhook.

use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context, CreateEmbed};

use crate::core::config::LoggingConfig;
use crate::discord::Data;

/// A loggable occurrence, one variant per flag column.
#[derive(Debug, Clone)]
pub enum GuildLogEvent {
    MemberJoined {
        user_id: u64,
        name: String,
        avatar_url: Option<String>,
    },
    MemberLeft {
        user_id: u64,
        name: String,
        avatar_url: Option<String>,
    },
    MemberBanned {
        user_id: u64,
        name: String,
    },
    MemberUnbanned {
        user_id: u64,
        name: String,
    },
    MemberRenamed {
        user_id: u64,
        old_nick: Option<String>,
        new_nick: Option<String>,
    },
    MemberRolesChanged {
        user_id: u64,
        added: Vec<u64>,
        removed: Vec<u64>,
    },
    MessageEdited {
        channel_id: u64,
        author_id: u64,
        before: Option<String>,
        after: String,
    },
    MessageDeleted {
        channel_id: u64,
        author_id: Option<u64>,
        content: Option<String>,
    },
}

impl GuildLogEvent {
    fn enabled_for(&self, config: &LoggingConfig) -> bool {
        match self {
            GuildLogEvent::MemberJoined { .. } => config.member_join,
            GuildLogEvent::MemberLeft { .. } => config.member_leave,
            GuildLogEvent::MemberBanned { .. } => config.member_ban,
            GuildLogEvent::MemberUnbanned { .. } => config.member_unban,
            GuildLogEvent::MemberRenamed { .. } => config.member_rename,
            GuildLogEvent::MemberRolesChanged { .. } => config.member_role_change,
            GuildLogEvent::MessageEdited { .. } => config.message_edit,
            GuildLogEvent::MessageDeleted { .. } => config.message_delete,
        }
    }

    fn embed(&self) -> CreateEmbed {
        match self {
            GuildLogEvent::MemberJoined {
                user_id,
                name,
                avatar_url,
            } => {
                let mut embed = CreateEmbed::new()
                    .title("Member joined")
                    .description(format!("<@{}> ({})", user_id, name))
                    .color(0x57F287);
                if let Some(url) = avatar_url {
                    embed = embed.thumbnail(url);
                }
                embed
            }
            GuildLogEvent::MemberLeft {
                user_id,
                name,
                avatar_url,
            } => {
                let mut embed = CreateEmbed::new()
                    .title("Member left")
                    .description(format!("<@{}> ({})", user_id, name))
                    .color(0xED4245);
                if let Some(url) = avatar_url {
                    embed = embed.thumbnail(url);
                }
                embed
            }
            GuildLogEvent::MemberBanned { user_id, name } => CreateEmbed::new()
                .title("Member banned")
                .description(format!("<@{}> ({})", user_id, name))
                .color(0xED4245),
            GuildLogEvent::MemberUnbanned { user_id, name } => CreateEmbed::new()
                .title("Member unbanned")
                .description(format!("<@{}> ({})", user_id, name))
                .color(0x57F287),
            GuildLogEvent::MemberRenamed {
                user_id,
                old_nick,
                new_nick,
            } => CreateEmbed::new()
                .title("Nickname changed")
                .description(format!("<@{}>", user_id))
                .field("Before", old_nick.as_deref().unwrap_or("*none*"), true)
                .field("After", new_nick.as_deref().unwrap_or("*none*"), true)
                .color(0xFEE75C),
            GuildLogEvent::MemberRolesChanged {
                user_id,
                added,
                removed,
            } => {
                let list = |roles: &[u64]| {
                    if roles.is_empty() {
                        "*none*".to_string()
                    } else {
                        roles
                            .iter()
                            .map(|role| format!("<@&{}>", role))
                            .collect::<Vec<_>>()
                            .join(", ")
                    }
                };
                CreateEmbed::new()
                    .title("Roles changed")
                    .description(format!("<@{}>", user_id))
                    .field("Added", list(added), true)
                    .field("Removed", list(removed), true)
                    .color(0xFEE75C)
            }
            GuildLogEvent::MessageEdited {
                channel_id,
                author_id,
                before,
                after,
            } => CreateEmbed::new()
                .title("Message edited")
                .description(format!("<@{}> in <#{}>", author_id, channel_id))
                .field(
                    "Before",
                    before.as_deref().unwrap_or("*unavailable*"),
                    false,
                )
                .field("After", after.clone(), false)
                .color(0xFEE75C),
            GuildLogEvent::MessageDeleted {
                channel_id,
                author_id,
                content,
            } => CreateEmbed::new()
                .title("Message deleted")
                .description(match author_id {
                    Some(author_id) => format!("<@{}> in <#{}>", author_id, channel_id),
                    None => format!("In <#{}>", channel_id),
                })
                .field(
                    "Content",
                    content.as_deref().unwrap_or("*unavailable*"),
                    false,
                )
                .color(0xED4245),
        }
    }
}

/// Deliver an event through the guild's webhook, honoring the per-event
/// flag and the module's active flag.
pub async fn dispatch(
    ctx: &Context,
    data: &Data,
    guild_id: u64,
    event: GuildLogEvent,
) -> Result<()> {
    let Some(config) = data.config.get_logging(guild_id).await? else {
        return Ok(());
    };
    if !config.active || !event.enabled_for(&config) {
        return Ok(());
    }

    let (Some(webhook_id), Some(token)) = (config.webhook_id, config.webhook_token.as_deref())
    else {
        return Ok(());
    };

    let webhook = ctx
        .http
        .get_webhook_with_token(serenity::WebhookId::new(webhook_id), token)
        .await?;

    webhook
        .execute(
            &ctx.http,
            false,
            serenity::ExecuteWebhook::new().embed(event.embed()),
        )
        .await?;

    Ok(())
}

pub async fn handle_member_join(
    ctx: &Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<()> {
    let event = GuildLogEvent::MemberJoined {
        user_id: member.user.id.get(),
        name: member.user.name.clone(),
        avatar_url: member.user.avatar_url(),
    };
    dispatch(ctx, data, member.guild_id.get(), event).await
}

pub async fn handle_member_remove(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let event = GuildLogEvent::MemberLeft {
        user_id: user.id.get(),
        name: user.name.clone(),
        avatar_url: user.avatar_url(),
    };
    dispatch(ctx, data, guild_id.get(), event).await
}

pub async fn handle_ban(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let event = GuildLogEvent::MemberBanned {
        user_id: user.id.get(),
        name: user.name.clone(),
    };
    dispatch(ctx, data, guild_id.get(), event).await
}

pub async fn handle_unban(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let event = GuildLogEvent::MemberUnbanned {
        user_id: user.id.get(),
        name: user.name.clone(),
    };
    dispatch(ctx, data, guild_id.get(), event).await
}

/// Diff a member update into rename and role-change events.
pub async fn handle_member_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::Member>,
    event: &serenity::GuildMemberUpdateEvent,
) -> Result<()> {
    let Some(old) = old else {
        // Without the previous state there is nothing to diff against.
        return Ok(());
    };

    let guild_id = event.guild_id.get();
    let user_id = event.user.id.get();

    if old.nick != event.nick {
        let rename = GuildLogEvent::MemberRenamed {
            user_id,
            old_nick: old.nick.clone(),
            new_nick: event.nick.clone(),
        };
        dispatch(ctx, data, guild_id, rename).await?;
    }

    let added: Vec<u64> = event
        .roles
        .iter()
        .filter(|role| !old.roles.contains(role))
        .map(|role| role.get())
        .collect();
    let removed: Vec<u64> = old
        .roles
        .iter()
        .filter(|role| !event.roles.contains(role))
        .map(|role| role.get())
        .collect();

    if !added.is_empty() || !removed.is_empty() {
        let change = GuildLogEvent::MemberRolesChanged {
            user_id,
            added,
            removed,
        };
        dispatch(ctx, data, guild_id, change).await?;
    }

    Ok(())
}

pub async fn handle_message_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::Message>,
    new: Option<&serenity::Message>,
    event: &serenity::MessageUpdateEvent,
) -> Result<()> {
    let Some(guild_id) = event.guild_id else {
        return Ok(());
    };

    // Embed unfurls and other no-content updates are not edits.
    let after = match event
        .content
        .clone()
        .or_else(|| new.map(|m| m.content.clone()))
    {
        Some(content) => content,
        None => return Ok(()),
    };

    if let Some(author) = event.author.as_ref().or_else(|| new.map(|m| &m.author)) {
        if author.bot {
            return Ok(());
        }
    }

    let before = old.map(|m| m.content.clone());
    if before.as_deref() == Some(after.as_str()) {
        return Ok(());
    }

    let author_id = event
        .author
        .as_ref()
        .map(|a| a.id.get())
        .or_else(|| old.map(|m| m.author.id.get()))
        .unwrap_or(0);

    let edited = GuildLogEvent::MessageEdited {
        channel_id: event.channel_id.get(),
        author_id,
        before,
        after,
    };
    dispatch(ctx, data, guild_id.get(), edited).await
}

pub async fn handle_message_delete(
    ctx: &Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    guild_id: Option<serenity::GuildId>,
) -> Result<()> {
    let Some(guild_id) = guild_id else {
        return Ok(());
    };

    // Best effort: the cache may have already evicted the message.
    let cached = ctx
        .cache
        .message(channel_id, message_id)
        .map(|message| (message.author.id.get(), message.content.clone()));

    let (author_id, content) = match cached {
        Some((author_id, content)) => (Some(author_id), Some(content)),
        None => (None, None),
    };

    let deleted = GuildLogEvent::MessageDeleted {
        channel_id: channel_id.get(),
        author_id,
        content,
    };
    dispatch(ctx, data, guild_id.get(), deleted).await
}
