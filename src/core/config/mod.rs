// Per-guild configuration: entity models, the storage port, and the
// cached configuration service consumed by commands, event handlers and
// the authorization guards.

pub mod config_models;
pub mod config_service;

pub use config_models::*;
pub use config_service::*;
