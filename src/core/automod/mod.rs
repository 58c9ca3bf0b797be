// Automod - message classification against the guild's moderation config,
// plus the point ledger that escalates repeat offenders.

pub mod automod_models;
pub mod automod_service;

pub use automod_models::*;
pub use automod_service::*;
