// Guild configuration entities - one struct per table in the schema
// registry, plus the tagged enums stored in the moderation row.
//
// Pure domain types with no Discord dependencies. Snowflakes are u64;
// the store casts to i64 at the SQL boundary.

/// Action an automod category takes on a violating message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomodAction {
    #[default]
    None,
    Kick,
    Ban,
    Tempban,
    Tempmute,
    Mute,
}

impl AutomodAction {
    /// Member names as persisted by the schema (and its default literals).
    pub const MEMBERS: &'static [&'static str] =
        &["none", "kick", "ban", "tempban", "tempmute", "mute"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AutomodAction::None => "none",
            AutomodAction::Kick => "kick",
            AutomodAction::Ban => "ban",
            AutomodAction::Tempban => "tempban",
            AutomodAction::Tempmute => "tempmute",
            AutomodAction::Mute => "mute",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(AutomodAction::None),
            "kick" => Some(AutomodAction::Kick),
            "ban" => Some(AutomodAction::Ban),
            "tempban" => Some(AutomodAction::Tempban),
            "tempmute" => Some(AutomodAction::Tempmute),
            "mute" => Some(AutomodAction::Mute),
            _ => None,
        }
    }
}

/// Action taken when a user's accumulated automod points cross the
/// escalation threshold. `Points` means "keep collecting, never escalate".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomodFinalAction {
    Points,
    #[default]
    None,
    Kick,
    Ban,
    Tempban,
    Tempmute,
    Mute,
}

impl AutomodFinalAction {
    pub const MEMBERS: &'static [&'static str] = &[
        "points", "none", "kick", "ban", "tempban", "tempmute", "mute",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AutomodFinalAction::Points => "points",
            AutomodFinalAction::None => "none",
            AutomodFinalAction::Kick => "kick",
            AutomodFinalAction::Ban => "ban",
            AutomodFinalAction::Tempban => "tempban",
            AutomodFinalAction::Tempmute => "tempmute",
            AutomodFinalAction::Mute => "mute",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "points" => Some(AutomodFinalAction::Points),
            "none" => Some(AutomodFinalAction::None),
            "kick" => Some(AutomodFinalAction::Kick),
            "ban" => Some(AutomodFinalAction::Ban),
            "tempban" => Some(AutomodFinalAction::Tempban),
            "tempmute" => Some(AutomodFinalAction::Tempmute),
            "mute" => Some(AutomodFinalAction::Mute),
            _ => None,
        }
    }
}

/// Which mentions count toward the mention-spam threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MentionSettings {
    /// Only direct member mentions.
    #[default]
    Member,
    /// Member and role mentions.
    IncludeRoles,
    /// Member mentions plus @everyone/@here.
    IncludeMass,
    /// Everything.
    IncludeAll,
}

impl MentionSettings {
    pub const MEMBERS: &'static [&'static str] =
        &["member", "include_roles", "include_mass", "include_all"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MentionSettings::Member => "member",
            MentionSettings::IncludeRoles => "include_roles",
            MentionSettings::IncludeMass => "include_mass",
            MentionSettings::IncludeAll => "include_all",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "member" => Some(MentionSettings::Member),
            "include_roles" => Some(MentionSettings::IncludeRoles),
            "include_mass" => Some(MentionSettings::IncludeMass),
            "include_all" => Some(MentionSettings::IncludeAll),
            _ => None,
        }
    }
}

/// One of the independently configurable automod triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutomodCategory {
    Invite,
    Link,
    Mention,
    Caps,
}

impl AutomodCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            AutomodCategory::Invite => "Invites",
            AutomodCategory::Link => "Links",
            AutomodCategory::Mention => "Mentions",
            AutomodCategory::Caps => "Caps",
        }
    }
}

/// Per-guild leveling configuration (`leveling` table).
#[derive(Debug, Clone, PartialEq)]
pub struct LevelingConfig {
    pub guild_id: u64,
    pub active: bool,
    /// Channel for level-up announcements; None means the message's channel.
    pub channel: Option<u64>,
    /// Level-up message template ({user}, {level}, {guild}).
    pub message: Option<String>,
    /// Reward roles, ordered; the i-th role unlocks at level 5 * (i + 1).
    pub roles: Vec<u64>,
    pub no_xp_channels: Vec<u64>,
    pub no_xp_role: Option<u64>,
    /// Drop lower reward roles when a new one is granted.
    pub remove_roles: bool,
}

impl LevelingConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            active: false,
            channel: None,
            message: None,
            roles: Vec::new(),
            no_xp_channels: Vec::new(),
            no_xp_role: None,
            remove_roles: false,
        }
    }
}

/// One row of the `leveling_users` table; (guild_id, user_id) is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelingUser {
    pub guild_id: u64,
    pub user_id: u64,
    pub xp: u64,
}

/// Per-guild welcome configuration (`welcome` table). Join and leave are
/// independently toggleable beneath the module flag.
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeConfig {
    pub guild_id: u64,
    pub active: bool,
    pub join_channel: Option<u64>,
    pub join_message: Option<String>,
    pub join_roles: Vec<u64>,
    pub join_active: bool,
    pub leave_channel: Option<u64>,
    pub leave_message: Option<String>,
    pub leave_active: bool,
}

impl WelcomeConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            active: false,
            join_channel: None,
            join_message: None,
            join_roles: Vec::new(),
            join_active: false,
            leave_channel: None,
            leave_message: None,
            leave_active: false,
        }
    }
}

/// Per-guild logging configuration (`logging` table): webhook target plus
/// one flag per loggable event type.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub guild_id: u64,
    pub active: bool,
    pub webhook_id: Option<u64>,
    pub webhook_channel: Option<u64>,
    pub webhook_token: Option<String>,
    pub member_join: bool,
    pub member_leave: bool,
    pub member_ban: bool,
    pub member_unban: bool,
    pub member_rename: bool,
    pub member_role_change: bool,
    pub message_edit: bool,
    pub message_delete: bool,
}

impl LoggingConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            active: false,
            webhook_id: None,
            webhook_channel: None,
            webhook_token: None,
            member_join: false,
            member_leave: false,
            member_ban: false,
            member_unban: false,
            member_rename: false,
            member_role_change: false,
            message_edit: false,
            message_delete: false,
        }
    }
}

/// One automod category's rule: action, exemptions, point cost.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub action: AutomodAction,
    pub whitelist_channels: Vec<u64>,
    pub whitelist_roles: Vec<u64>,
    pub points: u16,
}

impl Default for CategoryRule {
    fn default() -> Self {
        Self {
            action: AutomodAction::None,
            whitelist_channels: Vec::new(),
            whitelist_roles: Vec::new(),
            points: 1,
        }
    }
}

/// Per-guild moderation configuration (`moderation` table).
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationConfig {
    pub guild_id: u64,
    pub mod_roles: Vec<u64>,
    pub ignored_roles: Vec<u64>,
    pub mute_role: Option<u64>,
    pub log_channel: Option<u64>,
    /// Duration of temporary bans, in seconds.
    pub ban_time: u32,
    /// Duration of mutes/timeouts, in seconds.
    pub mute_time: u32,
    pub active: bool,
    pub automod_action: AutomodFinalAction,
    /// DM the user when an automod action is taken.
    pub notify_user: bool,
    pub invite: CategoryRule,
    /// Invite codes that never count as violations.
    pub invite_allowed: Vec<String>,
    pub link: CategoryRule,
    /// Domains checked against `link_is_whitelist` semantics.
    pub link_list: Vec<String>,
    /// true: `link_list` is the allowed set; false: it is the blocked set.
    pub link_is_whitelist: bool,
    pub mention: CategoryRule,
    pub mention_settings: MentionSettings,
    /// Mentions above this count are a violation.
    pub mention_count: u16,
    pub caps: CategoryRule,
}

impl ModerationConfig {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            mod_roles: Vec::new(),
            ignored_roles: Vec::new(),
            mute_role: None,
            log_channel: None,
            ban_time: 86400,
            mute_time: 86400,
            active: false,
            automod_action: AutomodFinalAction::None,
            notify_user: true,
            invite: CategoryRule::default(),
            invite_allowed: Vec::new(),
            link: CategoryRule::default(),
            link_list: Vec::new(),
            link_is_whitelist: true,
            mention: CategoryRule::default(),
            mention_settings: MentionSettings::Member,
            mention_count: 5,
            caps: CategoryRule::default(),
        }
    }

    pub fn rule(&self, category: AutomodCategory) -> &CategoryRule {
        match category {
            AutomodCategory::Invite => &self.invite,
            AutomodCategory::Link => &self.link,
            AutomodCategory::Mention => &self.mention,
            AutomodCategory::Caps => &self.caps,
        }
    }

    pub fn rule_mut(&mut self, category: AutomodCategory) -> &mut CategoryRule {
        match category {
            AutomodCategory::Invite => &mut self.invite,
            AutomodCategory::Link => &mut self.link,
            AutomodCategory::Mention => &mut self.mention,
            AutomodCategory::Caps => &mut self.caps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_names_round_trip() {
        for name in AutomodAction::MEMBERS {
            assert_eq!(AutomodAction::from_name(name).unwrap().as_str(), *name);
        }
        for name in AutomodFinalAction::MEMBERS {
            assert_eq!(AutomodFinalAction::from_name(name).unwrap().as_str(), *name);
        }
        for name in MentionSettings::MEMBERS {
            assert_eq!(MentionSettings::from_name(name).unwrap().as_str(), *name);
        }
    }

    #[test]
    fn enum_defaults_match_schema_defaults() {
        assert_eq!(AutomodAction::default(), AutomodAction::None);
        assert_eq!(AutomodFinalAction::default(), AutomodFinalAction::None);
        assert_eq!(MentionSettings::default(), MentionSettings::Member);
    }

    #[test]
    fn moderation_defaults_match_schema() {
        let config = ModerationConfig::new(1);
        assert!(!config.active);
        assert!(config.notify_user);
        assert_eq!(config.ban_time, 86400);
        assert_eq!(config.mute_time, 86400);
        assert_eq!(config.mention_count, 5);
        assert!(config.link_is_whitelist);
        assert_eq!(config.invite.points, 1);
        assert_eq!(config.invite.action, AutomodAction::None);
    }
}
