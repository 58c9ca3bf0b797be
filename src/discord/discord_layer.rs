// Discord layer - commands, checks and gateway event adapters.

pub mod checks;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "events/event_router.rs"]
pub mod events;

use crate::core::automod::AutomodService;
use crate::core::config::GuildConfigService;
use crate::core::guards::GuardService;
use crate::core::leveling::LevelingService;
use crate::core::locale::Localizer;
use crate::infra::SqliteConfigStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Locale used when an interaction carries none (gateway events, DMs).
pub const DEFAULT_LOCALE: &str = "en-US";

/// Data shared across all commands and event handlers.
pub struct Data {
    pub config: Arc<GuildConfigService<SqliteConfigStore>>,
    pub guards: Arc<GuardService>,
    pub leveling: Arc<LevelingService<SqliteConfigStore>>,
    pub automod: Arc<AutomodService>,
    pub locales: Arc<Localizer>,
}
