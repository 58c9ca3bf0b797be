// Automod domain models. Pure types; the discord layer extracts
// `MessageFacts` from gateway payloads and executes the resulting actions.

use crate::core::config::{AutomodAction, AutomodCategory, AutomodFinalAction};

/// Discord-agnostic facts about a message.
#[derive(Debug, Clone, Default)]
pub struct MessageFacts {
    pub guild_id: u64,
    pub user_id: u64,
    pub channel_id: u64,
    pub author_roles: Vec<u64>,
    pub content: String,
    pub user_mentions: u32,
    pub role_mentions: u32,
    pub mentions_everyone: bool,
}

/// A triggered automod rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub category: AutomodCategory,
    pub action: AutomodAction,
    pub points: u16,
    pub reason: String,
}

/// Raised when a user's accumulated points cross the escalation threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    pub action: AutomodFinalAction,
    pub total_points: u16,
}
