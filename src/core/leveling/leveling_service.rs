// Leveling business logic: XP rolls, cooldowns, and the level curve.
// No Discord types here; the discord layer handles announcements and
// reward roles.

use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::core::config::{ConfigError, ConfigStore, GuildConfigService, LevelingUser};

/// XP awarded per qualifying message.
pub const XP_PER_MESSAGE: RangeInclusive<u64> = 15..=25;

/// Minimum time between XP gains per user.
pub const XP_COOLDOWN: Duration = Duration::from_secs(60);

/// Raised when a user crosses a level threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpEvent {
    pub guild_id: u64,
    pub user_id: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub total_xp: u64,
}

/// Why a message earned no XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Module inactive or never configured for the guild.
    ModuleInactive,
    NoXpChannel,
    NoXpRole,
    Cooldown,
}

/// Outcome of processing one message.
#[derive(Debug, Clone, PartialEq)]
pub enum XpOutcome {
    Awarded { total_xp: u64 },
    LevelUp(LevelUpEvent),
    Skipped(SkipReason),
}

/// XP needed to advance from `level` to `level + 1`.
pub fn xp_to_next_level(level: u32) -> u64 {
    let level = level as u64;
    5 * level * level + 50 * level + 100
}

/// Total XP at which `level` is reached.
pub fn xp_for_level(level: u32) -> u64 {
    (0..level).map(xp_to_next_level).sum()
}

pub fn level_from_xp(xp: u64) -> u32 {
    let mut level = 0;
    let mut threshold = 0;
    loop {
        threshold += xp_to_next_level(level);
        if xp < threshold {
            return level;
        }
        level += 1;
    }
}

/// Reward roles unlocked at `level`: the i-th configured role opens up at
/// level 5 * (i + 1).
pub fn unlocked_rewards(roles: &[u64], level: u32) -> &[u64] {
    let unlocked = (level as usize / 5).min(roles.len());
    &roles[..unlocked]
}

pub struct LevelingService<S: ConfigStore> {
    config: Arc<GuildConfigService<S>>,
    cooldowns: DashMap<(u64, u64), Instant>,
    cooldown: Duration,
}

impl<S: ConfigStore> LevelingService<S> {
    pub fn new(config: Arc<GuildConfigService<S>>) -> Self {
        Self {
            config,
            cooldowns: DashMap::new(),
            cooldown: XP_COOLDOWN,
        }
    }

    #[cfg(test)]
    fn with_cooldown(config: Arc<GuildConfigService<S>>, cooldown: Duration) -> Self {
        Self {
            config,
            cooldowns: DashMap::new(),
            cooldown,
        }
    }

    /// Award XP for a message if the guild's leveling config allows it.
    pub async fn process_message(
        &self,
        guild_id: u64,
        user_id: u64,
        channel_id: u64,
        author_roles: &[u64],
    ) -> Result<XpOutcome, ConfigError> {
        let config = match self.config.get_leveling(guild_id).await? {
            Some(config) if config.active => config,
            _ => return Ok(XpOutcome::Skipped(SkipReason::ModuleInactive)),
        };

        if config.no_xp_channels.contains(&channel_id) {
            return Ok(XpOutcome::Skipped(SkipReason::NoXpChannel));
        }

        if let Some(no_xp_role) = config.no_xp_role {
            if author_roles.contains(&no_xp_role) {
                return Ok(XpOutcome::Skipped(SkipReason::NoXpRole));
            }
        }

        let key = (guild_id, user_id);
        if let Some(last_gain) = self.cooldowns.get(&key) {
            if last_gain.elapsed() < self.cooldown {
                return Ok(XpOutcome::Skipped(SkipReason::Cooldown));
            }
        }
        self.cooldowns.insert(key, Instant::now());

        let amount = rand::thread_rng().gen_range(XP_PER_MESSAGE);
        let total_xp = self.config.add_xp(guild_id, user_id, amount).await?;

        let old_level = level_from_xp(total_xp - amount);
        let new_level = level_from_xp(total_xp);

        if new_level > old_level {
            Ok(XpOutcome::LevelUp(LevelUpEvent {
                guild_id,
                user_id,
                old_level,
                new_level,
                total_xp,
            }))
        } else {
            Ok(XpOutcome::Awarded { total_xp })
        }
    }

    /// A user's XP and level.
    pub async fn rank_of(&self, guild_id: u64, user_id: u64) -> Result<(u64, u32), ConfigError> {
        let xp = self.config.get_xp(guild_id, user_id).await?;
        Ok((xp, level_from_xp(xp)))
    }

    pub async fn leaderboard(
        &self,
        guild_id: u64,
        limit: u32,
    ) -> Result<Vec<LevelingUser>, ConfigError> {
        self.config.top_users(guild_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LevelingConfig, LoggingConfig, ModerationConfig, WelcomeConfig};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const GUILD: u64 = 42;
    const USER: u64 = 7;
    const CHANNEL: u64 = 9;

    #[derive(Default)]
    struct MemoryStore {
        leveling: Mutex<Option<LevelingConfig>>,
        xp: DashMap<(u64, u64), u64>,
    }

    #[async_trait]
    impl ConfigStore for MemoryStore {
        async fn get_leveling(&self, _: u64) -> Result<Option<LevelingConfig>, ConfigError> {
            Ok(self.leveling.lock().unwrap().clone())
        }

        async fn upsert_leveling(&self, config: &LevelingConfig) -> Result<(), ConfigError> {
            *self.leveling.lock().unwrap() = Some(config.clone());
            Ok(())
        }

        async fn get_welcome(&self, _: u64) -> Result<Option<WelcomeConfig>, ConfigError> {
            Ok(None)
        }

        async fn upsert_welcome(&self, _: &WelcomeConfig) -> Result<(), ConfigError> {
            Ok(())
        }

        async fn get_logging(&self, _: u64) -> Result<Option<LoggingConfig>, ConfigError> {
            Ok(None)
        }

        async fn upsert_logging(&self, _: &LoggingConfig) -> Result<(), ConfigError> {
            Ok(())
        }

        async fn get_moderation(&self, _: u64) -> Result<Option<ModerationConfig>, ConfigError> {
            Ok(None)
        }

        async fn upsert_moderation(&self, _: &ModerationConfig) -> Result<(), ConfigError> {
            Ok(())
        }

        async fn get_xp(&self, guild_id: u64, user_id: u64) -> Result<u64, ConfigError> {
            Ok(self.xp.get(&(guild_id, user_id)).map(|v| *v).unwrap_or(0))
        }

        async fn add_xp(
            &self,
            guild_id: u64,
            user_id: u64,
            amount: u64,
        ) -> Result<u64, ConfigError> {
            let mut total = self.xp.entry((guild_id, user_id)).or_insert(0);
            *total += amount;
            Ok(*total)
        }

        async fn top_users(&self, _: u64, _: u32) -> Result<Vec<LevelingUser>, ConfigError> {
            Ok(Vec::new())
        }
    }

    fn service_with(config: LevelingConfig) -> LevelingService<MemoryStore> {
        let store = MemoryStore::default();
        *store.leveling.lock().unwrap() = Some(config);
        LevelingService::new(Arc::new(GuildConfigService::new(store)))
    }

    fn active_config() -> LevelingConfig {
        let mut config = LevelingConfig::new(GUILD);
        config.active = true;
        config
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(xp_for_level(0), 0);
        assert_eq!(xp_for_level(1), 100);
        assert_eq!(xp_for_level(2), 255);
        assert_eq!(xp_for_level(3), 475);
    }

    #[test]
    fn level_from_xp_matches_thresholds() {
        assert_eq!(level_from_xp(0), 0);
        assert_eq!(level_from_xp(99), 0);
        assert_eq!(level_from_xp(100), 1);
        assert_eq!(level_from_xp(254), 1);
        assert_eq!(level_from_xp(255), 2);
    }

    #[test]
    fn reward_unlocks_every_five_levels() {
        let roles = [10, 20, 30];
        assert_eq!(unlocked_rewards(&roles, 4), &[] as &[u64]);
        assert_eq!(unlocked_rewards(&roles, 5), &[10]);
        assert_eq!(unlocked_rewards(&roles, 12), &[10, 20]);
        assert_eq!(unlocked_rewards(&roles, 99), &[10, 20, 30]);
    }

    #[tokio::test]
    async fn inactive_module_earns_nothing() {
        let service = service_with(LevelingConfig::new(GUILD));

        let outcome = service
            .process_message(GUILD, USER, CHANNEL, &[])
            .await
            .unwrap();
        assert_eq!(outcome, XpOutcome::Skipped(SkipReason::ModuleInactive));
    }

    #[tokio::test]
    async fn exempt_channel_earns_nothing() {
        let mut config = active_config();
        config.no_xp_channels = vec![CHANNEL];
        let service = service_with(config);

        let outcome = service
            .process_message(GUILD, USER, CHANNEL, &[])
            .await
            .unwrap();
        assert_eq!(outcome, XpOutcome::Skipped(SkipReason::NoXpChannel));
    }

    #[tokio::test]
    async fn exempt_role_earns_nothing() {
        let mut config = active_config();
        config.no_xp_role = Some(555);
        let service = service_with(config);

        let outcome = service
            .process_message(GUILD, USER, CHANNEL, &[555])
            .await
            .unwrap();
        assert_eq!(outcome, XpOutcome::Skipped(SkipReason::NoXpRole));
    }

    #[tokio::test]
    async fn second_message_within_cooldown_is_skipped() {
        let service = service_with(active_config());

        let first = service
            .process_message(GUILD, USER, CHANNEL, &[])
            .await
            .unwrap();
        assert!(matches!(first, XpOutcome::Awarded { .. }));

        let second = service
            .process_message(GUILD, USER, CHANNEL, &[])
            .await
            .unwrap();
        assert_eq!(second, XpOutcome::Skipped(SkipReason::Cooldown));
    }

    #[tokio::test]
    async fn crossing_a_threshold_reports_a_level_up() {
        let store = MemoryStore::default();
        *store.leveling.lock().unwrap() = Some(active_config());
        // 99 XP: any roll in 15..=25 crosses the 100 XP threshold.
        store.xp.insert((GUILD, USER), 99);

        let service = LevelingService::with_cooldown(
            Arc::new(GuildConfigService::new(store)),
            Duration::ZERO,
        );

        let outcome = service
            .process_message(GUILD, USER, CHANNEL, &[])
            .await
            .unwrap();

        match outcome {
            XpOutcome::LevelUp(event) => {
                assert_eq!(event.old_level, 0);
                assert_eq!(event.new_level, 1);
                assert!(event.total_xp >= 114);
            }
            other => panic!("expected a level up, got {other:?}"),
        }
    }
}
