// Cached access to per-guild configuration.
//
// `ConfigStore` is the port the infra layer implements. The service keeps a
// read-through cache per entity in front of it; guards, commands and event
// handlers all go through the cache, and every write re-primes it.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use super::config_models::{
    LevelingConfig, LevelingUser, LoggingConfig, ModerationConfig, WelcomeConfig,
};
use crate::core::guards::{GuardError, ModuleGate};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Persistence port for the guild configuration tables.
///
/// Rows are created on first write (lazy upsert); a `get_*` returning
/// `None` means the guild was never configured.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_leveling(&self, guild_id: u64) -> Result<Option<LevelingConfig>, ConfigError>;
    async fn upsert_leveling(&self, config: &LevelingConfig) -> Result<(), ConfigError>;

    async fn get_welcome(&self, guild_id: u64) -> Result<Option<WelcomeConfig>, ConfigError>;
    async fn upsert_welcome(&self, config: &WelcomeConfig) -> Result<(), ConfigError>;

    async fn get_logging(&self, guild_id: u64) -> Result<Option<LoggingConfig>, ConfigError>;
    async fn upsert_logging(&self, config: &LoggingConfig) -> Result<(), ConfigError>;

    async fn get_moderation(&self, guild_id: u64) -> Result<Option<ModerationConfig>, ConfigError>;
    async fn upsert_moderation(&self, config: &ModerationConfig) -> Result<(), ConfigError>;

    /// Current XP of a user; 0 if no row exists.
    async fn get_xp(&self, guild_id: u64, user_id: u64) -> Result<u64, ConfigError>;

    /// Add XP, creating the row on first gain. Returns the new total.
    async fn add_xp(&self, guild_id: u64, user_id: u64, amount: u64) -> Result<u64, ConfigError>;

    /// Top users of a guild by XP, descending.
    async fn top_users(&self, guild_id: u64, limit: u32) -> Result<Vec<LevelingUser>, ConfigError>;
}

pub struct GuildConfigService<S: ConfigStore> {
    store: S,
    leveling: DashMap<u64, Arc<LevelingConfig>>,
    welcome: DashMap<u64, Arc<WelcomeConfig>>,
    logging: DashMap<u64, Arc<LoggingConfig>>,
    moderation: DashMap<u64, Arc<ModerationConfig>>,
}

impl<S: ConfigStore> GuildConfigService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            leveling: DashMap::new(),
            welcome: DashMap::new(),
            logging: DashMap::new(),
            moderation: DashMap::new(),
        }
    }

    pub async fn get_leveling(
        &self,
        guild_id: u64,
    ) -> Result<Option<Arc<LevelingConfig>>, ConfigError> {
        if let Some(cached) = self.leveling.get(&guild_id) {
            return Ok(Some(Arc::clone(&cached)));
        }

        match self.store.get_leveling(guild_id).await? {
            Some(config) => {
                let config = Arc::new(config);
                self.leveling.insert(guild_id, Arc::clone(&config));
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    /// Load-or-default, mutate, persist, re-prime the cache.
    pub async fn update_leveling<F>(
        &self,
        guild_id: u64,
        mutate: F,
    ) -> Result<Arc<LevelingConfig>, ConfigError>
    where
        F: FnOnce(&mut LevelingConfig),
    {
        let mut config = match self.store.get_leveling(guild_id).await? {
            Some(config) => config,
            None => LevelingConfig::new(guild_id),
        };
        mutate(&mut config);
        self.store.upsert_leveling(&config).await?;

        let config = Arc::new(config);
        self.leveling.insert(guild_id, Arc::clone(&config));
        Ok(config)
    }

    pub async fn get_welcome(
        &self,
        guild_id: u64,
    ) -> Result<Option<Arc<WelcomeConfig>>, ConfigError> {
        if let Some(cached) = self.welcome.get(&guild_id) {
            return Ok(Some(Arc::clone(&cached)));
        }

        match self.store.get_welcome(guild_id).await? {
            Some(config) => {
                let config = Arc::new(config);
                self.welcome.insert(guild_id, Arc::clone(&config));
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    pub async fn update_welcome<F>(
        &self,
        guild_id: u64,
        mutate: F,
    ) -> Result<Arc<WelcomeConfig>, ConfigError>
    where
        F: FnOnce(&mut WelcomeConfig),
    {
        let mut config = match self.store.get_welcome(guild_id).await? {
            Some(config) => config,
            None => WelcomeConfig::new(guild_id),
        };
        mutate(&mut config);
        self.store.upsert_welcome(&config).await?;

        let config = Arc::new(config);
        self.welcome.insert(guild_id, Arc::clone(&config));
        Ok(config)
    }

    pub async fn get_logging(
        &self,
        guild_id: u64,
    ) -> Result<Option<Arc<LoggingConfig>>, ConfigError> {
        if let Some(cached) = self.logging.get(&guild_id) {
            return Ok(Some(Arc::clone(&cached)));
        }

        match self.store.get_logging(guild_id).await? {
            Some(config) => {
                let config = Arc::new(config);
                self.logging.insert(guild_id, Arc::clone(&config));
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    pub async fn update_logging<F>(
        &self,
        guild_id: u64,
        mutate: F,
    ) -> Result<Arc<LoggingConfig>, ConfigError>
    where
        F: FnOnce(&mut LoggingConfig),
    {
        let mut config = match self.store.get_logging(guild_id).await? {
            Some(config) => config,
            None => LoggingConfig::new(guild_id),
        };
        mutate(&mut config);
        self.store.upsert_logging(&config).await?;

        let config = Arc::new(config);
        self.logging.insert(guild_id, Arc::clone(&config));
        Ok(config)
    }

    pub async fn get_moderation(
        &self,
        guild_id: u64,
    ) -> Result<Option<Arc<ModerationConfig>>, ConfigError> {
        if let Some(cached) = self.moderation.get(&guild_id) {
            return Ok(Some(Arc::clone(&cached)));
        }

        match self.store.get_moderation(guild_id).await? {
            Some(config) => {
                let config = Arc::new(config);
                self.moderation.insert(guild_id, Arc::clone(&config));
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    pub async fn update_moderation<F>(
        &self,
        guild_id: u64,
        mutate: F,
    ) -> Result<Arc<ModerationConfig>, ConfigError>
    where
        F: FnOnce(&mut ModerationConfig),
    {
        let mut config = match self.store.get_moderation(guild_id).await? {
            Some(config) => config,
            None => ModerationConfig::new(guild_id),
        };
        mutate(&mut config);
        self.store.upsert_moderation(&config).await?;

        let config = Arc::new(config);
        self.moderation.insert(guild_id, Arc::clone(&config));
        Ok(config)
    }

    /// Drop every cached entry for a guild; the next read hits the store.
    pub fn invalidate(&self, guild_id: u64) {
        self.leveling.remove(&guild_id);
        self.welcome.remove(&guild_id);
        self.logging.remove(&guild_id);
        self.moderation.remove(&guild_id);
    }

    /// Drop the whole cache.
    pub fn clear_cache(&self) {
        self.leveling.clear();
        self.welcome.clear();
        self.logging.clear();
        self.moderation.clear();
    }

    pub async fn get_xp(&self, guild_id: u64, user_id: u64) -> Result<u64, ConfigError> {
        self.store.get_xp(guild_id, user_id).await
    }

    pub async fn add_xp(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
    ) -> Result<u64, ConfigError> {
        self.store.add_xp(guild_id, user_id, amount).await
    }

    pub async fn top_users(
        &self,
        guild_id: u64,
        limit: u32,
    ) -> Result<Vec<LevelingUser>, ConfigError> {
        self.store.top_users(guild_id, limit).await
    }
}

/// Gate backing `Module::Leveling`: one cached config read, missing rows
/// count as disabled.
pub struct LevelingGate<S: ConfigStore> {
    config: Arc<GuildConfigService<S>>,
}

impl<S: ConfigStore> LevelingGate<S> {
    pub fn new(config: Arc<GuildConfigService<S>>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<S: ConfigStore> ModuleGate for LevelingGate<S> {
    async fn is_active(&self, guild_id: u64) -> Result<bool, GuardError> {
        let config = self
            .config
            .get_leveling(guild_id)
            .await
            .map_err(|e| GuardError::Lookup(e.to_string()))?;

        Ok(config.map(|c| c.active).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const GUILD: u64 = 42;

    /// Store that counts reads and keeps rows in memory.
    #[derive(Default)]
    struct CountingStore {
        leveling: Mutex<Option<LevelingConfig>>,
        leveling_reads: AtomicUsize,
        xp: DashMap<(u64, u64), u64>,
    }

    #[async_trait]
    impl ConfigStore for CountingStore {
        async fn get_leveling(&self, _: u64) -> Result<Option<LevelingConfig>, ConfigError> {
            self.leveling_reads.fetch_add(1, Ordering::SeqCst);
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
            Ok(self
                .xp
                .get(&(guild_id, user_id))
                .map(|v| *v)
                .unwrap_or(0))
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

    fn seeded_service(active: bool) -> GuildConfigService<CountingStore> {
        let store = CountingStore::default();
        let mut config = LevelingConfig::new(GUILD);
        config.active = active;
        *store.leveling.lock().unwrap() = Some(config);
        GuildConfigService::new(store)
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let service = seeded_service(true);

        service.get_leveling(GUILD).await.unwrap();
        service.get_leveling(GUILD).await.unwrap();

        assert_eq!(service.store.leveling_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_rows_are_not_cached() {
        let service = GuildConfigService::new(CountingStore::default());

        assert!(service.get_leveling(GUILD).await.unwrap().is_none());
        assert!(service.get_leveling(GUILD).await.unwrap().is_none());

        // Both reads went to the store; a row created later must be seen.
        assert_eq!(service.store.leveling_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn update_creates_default_row_and_primes_cache() {
        let service = GuildConfigService::new(CountingStore::default());

        let updated = service
            .update_leveling(GUILD, |config| config.active = true)
            .await
            .unwrap();
        assert!(updated.active);

        let reads_after_update = service.store.leveling_reads.load(Ordering::SeqCst);
        let cached = service.get_leveling(GUILD).await.unwrap().unwrap();
        assert!(cached.active);
        assert_eq!(
            service.store.leveling_reads.load(Ordering::SeqCst),
            reads_after_update
        );
    }

    #[tokio::test]
    async fn invalidate_forces_a_store_read() {
        let service = seeded_service(true);

        service.get_leveling(GUILD).await.unwrap();
        service.invalidate(GUILD);
        service.get_leveling(GUILD).await.unwrap();

        assert_eq!(service.store.leveling_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn leveling_gate_reflects_active_flag() {
        let service = Arc::new(seeded_service(false));
        let gate = LevelingGate::new(Arc::clone(&service));
        assert!(!gate.is_active(GUILD).await.unwrap());

        service
            .update_leveling(GUILD, |config| config.active = true)
            .await
            .unwrap();
        assert!(gate.is_active(GUILD).await.unwrap());
    }

    #[tokio::test]
    async fn leveling_gate_treats_missing_row_as_inactive() {
        let service = Arc::new(GuildConfigService::new(CountingStore::default()));
        let gate = LevelingGate::new(service);
        assert!(!gate.is_active(GUILD).await.unwrap());
    }
}
