// Automod checks: invites, links, mention spam, caps.
//
// `check_message` is a pure read of the config; only `register_violation`
// touches the in-memory point ledger. Authors holding a mod or ignored
// role are exempt from every category.

use dashmap::DashMap;

use super::automod_models::{Escalation, MessageFacts, Violation};
use crate::core::config::{AutomodAction, AutomodCategory, CategoryRule, MentionSettings, ModerationConfig};

/// Accumulated points at which the guild's final action fires.
pub const MAX_POINTS: u16 = 10;

/// Messages shorter than this never count as caps spam.
const CAPS_MIN_LETTERS: usize = 15;

/// Fraction of uppercase letters that counts as shouting.
const CAPS_RATIO: f64 = 0.7;

const INVITE_MARKERS: &[&str] = &[
    "discord.gg/",
    "discord.com/invite/",
    "discordapp.com/invite/",
];

/// Domains never flagged by the link check; invite handling owns them.
const DISCORD_DOMAINS: &[&str] = &["discord.gg", "discord.com", "discordapp.com"];

pub struct AutomodService {
    points: DashMap<(u64, u64), u16>,
}

impl Default for AutomodService {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomodService {
    pub fn new() -> Self {
        Self {
            points: DashMap::new(),
        }
    }

    /// Classify a message. Returns the first violated category, checked in
    /// the order invites, links, mentions, caps.
    pub fn check_message(
        &self,
        facts: &MessageFacts,
        config: &ModerationConfig,
    ) -> Option<Violation> {
        if !config.active {
            return None;
        }

        let privileged = facts
            .author_roles
            .iter()
            .any(|role| config.mod_roles.contains(role) || config.ignored_roles.contains(role));
        if privileged {
            return None;
        }

        check_invites(facts, config)
            .or_else(|| check_links(facts, config))
            .or_else(|| check_mentions(facts, config))
            .or_else(|| check_caps(facts, config))
    }

    /// Accrue a violation's points. Crossing `MAX_POINTS` resets the ledger
    /// and reports the guild's final action; the caller decides whether a
    /// `None`/`Points` final action means anything.
    pub fn register_violation(
        &self,
        guild_id: u64,
        user_id: u64,
        violation: &Violation,
        config: &ModerationConfig,
    ) -> Option<Escalation> {
        let mut total = self.points.entry((guild_id, user_id)).or_insert(0);
        *total = total.saturating_add(violation.points);

        if *total >= MAX_POINTS {
            let escalation = Escalation {
                action: config.automod_action,
                total_points: *total,
            };
            *total = 0;
            Some(escalation)
        } else {
            None
        }
    }

    /// Forget a user's accumulated points (e.g. after a manual pardon).
    pub fn clear_points(&self, guild_id: u64, user_id: u64) {
        self.points.remove(&(guild_id, user_id));
    }
}

/// Channel or author-role exemption for one category.
fn exempt(facts: &MessageFacts, rule: &CategoryRule) -> bool {
    rule.whitelist_channels.contains(&facts.channel_id)
        || facts
            .author_roles
            .iter()
            .any(|role| rule.whitelist_roles.contains(role))
}

fn violation(category: AutomodCategory, rule: &CategoryRule, reason: String) -> Option<Violation> {
    Some(Violation {
        category,
        action: rule.action,
        points: rule.points,
        reason,
    })
}

fn check_invites(facts: &MessageFacts, config: &ModerationConfig) -> Option<Violation> {
    let rule = &config.invite;
    if rule.action == AutomodAction::None || exempt(facts, rule) {
        return None;
    }

    let code = find_invite_code(&facts.content)?;
    if config.invite_allowed.iter().any(|allowed| allowed == code) {
        return None;
    }

    violation(
        AutomodCategory::Invite,
        rule,
        format!("posted a server invite (discord.gg/{code})"),
    )
}

fn check_links(facts: &MessageFacts, config: &ModerationConfig) -> Option<Violation> {
    let rule = &config.link;
    if rule.action == AutomodAction::None || exempt(facts, rule) {
        return None;
    }

    for domain in extract_domains(&facts.content) {
        if DISCORD_DOMAINS.contains(&domain.as_str()) {
            continue;
        }

        let listed = config.link_list.iter().any(|entry| entry == &domain);
        let blocked = if config.link_is_whitelist {
            !listed
        } else {
            listed
        };

        if blocked {
            return violation(
                AutomodCategory::Link,
                rule,
                format!("posted a forbidden link ({domain})"),
            );
        }
    }

    None
}

fn check_mentions(facts: &MessageFacts, config: &ModerationConfig) -> Option<Violation> {
    let rule = &config.mention;
    if rule.action == AutomodAction::None || exempt(facts, rule) {
        return None;
    }

    let mut count = facts.user_mentions;
    match config.mention_settings {
        MentionSettings::Member => {}
        MentionSettings::IncludeRoles => count += facts.role_mentions,
        MentionSettings::IncludeMass => {
            if facts.mentions_everyone {
                count += 1;
            }
        }
        MentionSettings::IncludeAll => {
            count += facts.role_mentions;
            if facts.mentions_everyone {
                count += 1;
            }
        }
    }

    if count > config.mention_count as u32 {
        violation(
            AutomodCategory::Mention,
            rule,
            format!("mentioned {count} members"),
        )
    } else {
        None
    }
}

fn check_caps(facts: &MessageFacts, config: &ModerationConfig) -> Option<Violation> {
    let rule = &config.caps;
    if rule.action == AutomodAction::None || exempt(facts, rule) {
        return None;
    }

    let letters: Vec<char> = facts.content.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < CAPS_MIN_LETTERS {
        return None;
    }

    let uppercase = letters.iter().filter(|c| c.is_uppercase()).count();
    if uppercase as f64 / letters.len() as f64 >= CAPS_RATIO {
        violation(
            AutomodCategory::Caps,
            rule,
            "message is mostly uppercase".to_string(),
        )
    } else {
        None
    }
}

/// First invite code in the message, if any.
fn find_invite_code(content: &str) -> Option<&str> {
    for marker in INVITE_MARKERS {
        if let Some(index) = content.find(marker) {
            let rest = &content[index + marker.len()..];
            let code = rest
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '-')
                .next()
                .unwrap_or("");
            if !code.is_empty() {
                return Some(code);
            }
        }
    }
    None
}

/// Lowercased domains of every http(s) URL in the message.
fn extract_domains(content: &str) -> Vec<String> {
    let mut domains = Vec::new();

    for token in content.split_whitespace() {
        let rest = token
            .strip_prefix("https://")
            .or_else(|| token.strip_prefix("http://"));

        if let Some(rest) = rest {
            let domain = rest
                .split(['/', '?', '#'])
                .next()
                .unwrap_or("")
                .split(':')
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            let domain = domain.strip_prefix("www.").unwrap_or(&domain);

            if !domain.is_empty() {
                domains.push(domain.to_string());
            }
        }
    }

    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AutomodFinalAction;

    const GUILD: u64 = 42;
    const USER: u64 = 7;

    fn facts(content: &str) -> MessageFacts {
        MessageFacts {
            guild_id: GUILD,
            user_id: USER,
            channel_id: 9,
            content: content.to_string(),
            ..MessageFacts::default()
        }
    }

    fn armed_config() -> ModerationConfig {
        let mut config = ModerationConfig::new(GUILD);
        config.active = true;
        config.invite.action = AutomodAction::Kick;
        config.link.action = AutomodAction::Mute;
        config.mention.action = AutomodAction::Tempmute;
        config.caps.action = AutomodAction::Ban;
        config
    }

    #[test]
    fn inactive_config_never_flags() {
        let mut config = armed_config();
        config.active = false;

        let service = AutomodService::new();
        assert_eq!(
            service.check_message(&facts("discord.gg/evilserver"), &config),
            None
        );
    }

    #[test]
    fn mod_roles_are_exempt() {
        let mut config = armed_config();
        config.mod_roles = vec![77];

        let mut message = facts("discord.gg/evilserver");
        message.author_roles = vec![77];

        let service = AutomodService::new();
        assert_eq!(service.check_message(&message, &config), None);
    }

    #[test]
    fn invites_are_flagged_unless_allowed() {
        let service = AutomodService::new();
        let mut config = armed_config();

        let flagged = service
            .check_message(&facts("join discord.gg/evilserver now"), &config)
            .expect("invite should be flagged");
        assert_eq!(flagged.category, AutomodCategory::Invite);
        assert_eq!(flagged.action, AutomodAction::Kick);

        config.invite_allowed = vec!["evilserver".to_string()];
        assert_eq!(
            service.check_message(&facts("join discord.gg/evilserver now"), &config),
            None
        );
    }

    #[test]
    fn whitelisted_channel_is_exempt_per_category() {
        let mut config = armed_config();
        config.invite.whitelist_channels = vec![9];

        let service = AutomodService::new();
        assert_eq!(
            service.check_message(&facts("discord.gg/evilserver"), &config),
            None
        );
    }

    #[test]
    fn link_whitelist_blocks_unlisted_domains() {
        let mut config = armed_config();
        config.link_list = vec!["example.com".to_string()];

        let service = AutomodService::new();
        assert_eq!(
            service.check_message(&facts("see https://example.com/page"), &config),
            None
        );

        let flagged = service
            .check_message(&facts("see https://evil.org/page"), &config)
            .expect("unlisted domain should be flagged");
        assert_eq!(flagged.category, AutomodCategory::Link);
    }

    #[test]
    fn link_blocklist_flags_listed_domains_only() {
        let mut config = armed_config();
        config.link_is_whitelist = false;
        config.link_list = vec!["evil.org".to_string()];

        let service = AutomodService::new();
        assert!(service
            .check_message(&facts("https://evil.org"), &config)
            .is_some());
        assert_eq!(
            service.check_message(&facts("https://example.com"), &config),
            None
        );
    }

    #[test]
    fn mention_count_honors_settings() {
        let config = armed_config();
        let service = AutomodService::new();

        let mut message = facts("hi");
        message.user_mentions = 5;
        message.role_mentions = 3;

        // member-only counting: 5 is within the default threshold of 5.
        assert_eq!(service.check_message(&message, &config), None);

        let mut config = config;
        config.mention_settings = MentionSettings::IncludeRoles;
        let flagged = service
            .check_message(&message, &config)
            .expect("8 mentions should be flagged");
        assert_eq!(flagged.category, AutomodCategory::Mention);
    }

    #[test]
    fn shouting_is_flagged() {
        let config = armed_config();
        let service = AutomodService::new();

        let flagged = service
            .check_message(&facts("STOP SPAMMING THIS CHANNEL"), &config)
            .expect("caps should be flagged");
        assert_eq!(flagged.category, AutomodCategory::Caps);

        assert_eq!(
            service.check_message(&facts("this is a normal sentence"), &config),
            None
        );
        // Too short to count.
        assert_eq!(service.check_message(&facts("WOW"), &config), None);
    }

    #[test]
    fn points_escalate_and_reset() {
        let mut config = armed_config();
        config.automod_action = AutomodFinalAction::Ban;
        config.invite.points = 4;

        let service = AutomodService::new();
        let violation = service
            .check_message(&facts("discord.gg/evilserver"), &config)
            .unwrap();

        assert_eq!(
            service.register_violation(GUILD, USER, &violation, &config),
            None
        );
        assert_eq!(
            service.register_violation(GUILD, USER, &violation, &config),
            None
        );

        let escalation = service
            .register_violation(GUILD, USER, &violation, &config)
            .expect("12 points should escalate");
        assert_eq!(escalation.action, AutomodFinalAction::Ban);
        assert_eq!(escalation.total_points, 12);

        // Ledger reset after escalation.
        assert_eq!(
            service.register_violation(GUILD, USER, &violation, &config),
            None
        );
    }

    #[test]
    fn domain_extraction_normalizes() {
        assert_eq!(
            extract_domains("go to https://WWW.Example.COM/path and http://a.b:8080/x"),
            vec!["example.com".to_string(), "a.b".to_string()]
        );
    }
}
