// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `discord/` = Discord-specific adapters (commands, checks, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Route gateway events to their adapters

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::automod::AutomodService;
use crate::core::config::{GuildConfigService, LevelingGate};
use crate::core::guards::{GuardError, GuardService, Module};
use crate::core::leveling::LevelingService;
use crate::core::locale::Localizer;
use crate::discord::events::{automod_events, log_events, welcome_events, xp_events};
use crate::discord::{Data, Error, DEFAULT_LOCALE};
use crate::infra::SqliteConfigStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events: automod and XP on
/// messages, welcome and guild logs on membership changes.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own)
            if new_message.author.bot {
                return Ok(());
            }

            let acted = match automod_events::handle_message(ctx, data, new_message).await {
                Ok(acted) => acted,
                Err(error) => {
                    tracing::error!("automod failed: {error}");
                    false
                }
            };

            // A removed message earns no XP.
            if !acted {
                if let Err(error) = xp_events::handle_message(ctx, data, new_message).await {
                    tracing::error!("xp processing failed: {error}");
                }
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(error) = welcome_events::handle_member_join(ctx, data, new_member).await {
                tracing::error!("welcome join failed: {error}");
            }
            if let Err(error) = log_events::handle_member_join(ctx, data, new_member).await {
                tracing::error!("join log failed: {error}");
            }
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            if let Err(error) =
                welcome_events::handle_member_leave(ctx, data, *guild_id, user).await
            {
                tracing::error!("welcome leave failed: {error}");
            }
            if let Err(error) = log_events::handle_member_remove(ctx, data, *guild_id, user).await
            {
                tracing::error!("leave log failed: {error}");
            }
        }
        serenity::FullEvent::GuildBanAddition {
            guild_id,
            banned_user,
        } => {
            if let Err(error) = log_events::handle_ban(ctx, data, *guild_id, banned_user).await {
                tracing::error!("ban log failed: {error}");
            }
        }
        serenity::FullEvent::GuildBanRemoval {
            guild_id,
            unbanned_user,
        } => {
            if let Err(error) = log_events::handle_unban(ctx, data, *guild_id, unbanned_user).await
            {
                tracing::error!("unban log failed: {error}");
            }
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            event,
            ..
        } => {
            if let Err(error) =
                log_events::handle_member_update(ctx, data, old_if_available.as_ref(), event).await
            {
                tracing::error!("member update log failed: {error}");
            }
        }
        serenity::FullEvent::MessageUpdate {
            old_if_available,
            new,
            event,
        } => {
            if let Err(error) = log_events::handle_message_update(
                ctx,
                data,
                old_if_available.as_ref(),
                new.as_ref(),
                event,
            )
            .await
            {
                tracing::error!("message edit log failed: {error}");
            }
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
        } => {
            if let Err(error) = log_events::handle_message_delete(
                ctx,
                data,
                *channel_id,
                *deleted_message_id,
                *guild_id,
            )
            .await
            {
                tracing::error!("message delete log failed: {error}");
            }
        }
        _ => {}
    }

    Ok(())
}

/// Render guard failures as ephemeral replies; everything else is logged.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if let Some(guard_error) = error.downcast_ref::<GuardError>() {
                reply_guard_error(ctx, guard_error).await;
            } else {
                tracing::error!("command error: {error}");
                let _ = ctx.say("Something went wrong running that command.").await;
            }
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            match error.as_ref().and_then(|e| e.downcast_ref::<GuardError>()) {
                Some(guard_error) => reply_guard_error(ctx, guard_error).await,
                None => {
                    let _ = ctx.say("You can't use this command here.").await;
                }
            }
        }
        other => {
            if let Err(error) = poise::builtins::on_error(other).await {
                tracing::error!("error while handling error: {error}");
            }
        }
    }
}

async fn reply_guard_error(ctx: crate::discord::Context<'_>, error: &GuardError) {
    let locale = ctx.locale().unwrap_or(DEFAULT_LOCALE);
    let message = match error {
        GuardError::OwnerOnly => ctx
            .data()
            .locales
            .translate(locale, "errors.owner_only", &[]),
        GuardError::ModuleDisabled(message) => message.clone(),
        GuardError::Lookup(detail) => {
            tracing::error!("guard lookup failed: {detail}");
            "Something went wrong checking this command's requirements.".to_string()
        }
    };

    let _ = ctx
        .send(
            poise::CreateReply::default()
                .content(message)
                .ephemeral(true),
        )
        .await;
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep the runtime database in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");
    let database_path = std::env::var("DATABASE_PATH")
        .unwrap_or_else(|_| format!("{}/palisade.db", data_dir));

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let store = SqliteConfigStore::new(&database_path)
        .await
        .expect("Failed to initialize SQLite store");
    let config = Arc::new(GuildConfigService::new(store));

    let locales =
        Arc::new(Localizer::from_dir("locales", DEFAULT_LOCALE).expect("Failed to load locales"));

    let leveling = Arc::new(LevelingService::new(Arc::clone(&config)));
    let automod = Arc::new(AutomodService::new());

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MODERATION;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::leveling::rank(),
                discord::commands::leveling::leaderboard(),
                discord::commands::leveling::leveling(),
                discord::commands::welcome::welcome(),
                discord::commands::logging::logging(),
                discord::commands::moderation::automod(),
                discord::commands::admin::reload(),
                discord::commands::admin::shutdown(),
            ],
            // Event handler for messages and other events
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("registering slash commands");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // Owner identity: env override first, application info otherwise.
                // The guard gets it injected instead of reaching for globals.
                let owner_id = match std::env::var("BOT_OWNER_ID")
                    .ok()
                    .and_then(|value| value.parse::<u64>().ok())
                {
                    Some(id) => id,
                    None => {
                        let info = ctx.http.get_current_application_info().await?;
                        info.owner
                            .as_ref()
                            .map(|owner| owner.id.get())
                            .ok_or("Bot owner could not be determined")?
                    }
                };

                let mut guards = GuardService::new(owner_id, Arc::clone(&locales));
                guards.register(
                    Module::Leveling,
                    Arc::new(LevelingGate::new(Arc::clone(&config))),
                );

                tracing::info!(owner_id, "bot is ready");

                Ok(Data {
                    config,
                    guards: Arc::new(guards),
                    leveling,
                    automod,
                    locales,
                })
            })
        })
        .build();

    // Keep enough messages cached that edit/delete logs usually have content.
    let mut settings = serenity::cache::Settings::default();
    settings.max_messages = 10000;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .cache_settings(settings)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
