// SQLite implementation of the ConfigStore port.
//
// Tables are created from the declarative schema registry. Snowflakes are
// stored as i64 and cast back at the boundary; list columns are
// JSON-encoded text, matching the registry's `'[]'` default literal.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

use crate::core::config::{
    AutomodAction, AutomodFinalAction, CategoryRule, ConfigError, ConfigStore, LevelingConfig,
    LevelingUser, LoggingConfig, MentionSettings, ModerationConfig, WelcomeConfig,
};
use crate::core::schema::guild_tables;

pub struct SqliteConfigStore {
    pool: Pool<Sqlite>,
}

impl SqliteConfigStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create every table declared in the schema registry.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for table in guild_tables() {
            sqlx::query(&table.create_sql()).execute(&self.pool).await?;
            tracing::debug!(table = table.name, "ensured table");
        }
        Ok(())
    }
}

fn storage_err(error: impl std::fmt::Display) -> ConfigError {
    ConfigError::Storage(error.to_string())
}

fn encode_ids(ids: &[u64]) -> Result<String, ConfigError> {
    serde_json::to_string(ids).map_err(storage_err)
}

fn encode_strings(values: &[String]) -> Result<String, ConfigError> {
    serde_json::to_string(values).map_err(storage_err)
}

/// JSON-encoded snowflake list; NULL decodes to empty.
fn id_list(row: &SqliteRow, column: &str) -> Result<Vec<u64>, ConfigError> {
    match row.get::<Option<String>, _>(column) {
        Some(raw) => serde_json::from_str(&raw).map_err(storage_err),
        None => Ok(Vec::new()),
    }
}

fn string_list(row: &SqliteRow, column: &str) -> Result<Vec<String>, ConfigError> {
    match row.get::<Option<String>, _>(column) {
        Some(raw) => serde_json::from_str(&raw).map_err(storage_err),
        None => Ok(Vec::new()),
    }
}

fn snowflake(row: &SqliteRow, column: &str) -> Option<u64> {
    row.get::<Option<i64>, _>(column).map(|v| v as u64)
}

fn row_to_leveling(row: &SqliteRow) -> Result<LevelingConfig, ConfigError> {
    Ok(LevelingConfig {
        guild_id: row.get::<i64, _>("id") as u64,
        active: row.get("active"),
        channel: snowflake(row, "channel"),
        message: row.get("message"),
        roles: id_list(row, "roles")?,
        no_xp_channels: id_list(row, "no_xp_channels")?,
        no_xp_role: snowflake(row, "no_xp_role"),
        remove_roles: row.get("remove_roles"),
    })
}

fn row_to_welcome(row: &SqliteRow) -> Result<WelcomeConfig, ConfigError> {
    Ok(WelcomeConfig {
        guild_id: row.get::<i64, _>("id") as u64,
        active: row.get("active"),
        join_channel: snowflake(row, "join_channel"),
        join_message: row.get("join_message"),
        join_roles: id_list(row, "join_roles")?,
        join_active: row.get("join_active"),
        leave_channel: snowflake(row, "leave_channel"),
        leave_message: row.get("leave_message"),
        leave_active: row.get("leave_active"),
    })
}

fn row_to_logging(row: &SqliteRow) -> Result<LoggingConfig, ConfigError> {
    Ok(LoggingConfig {
        guild_id: row.get::<i64, _>("id") as u64,
        active: row.get("active"),
        webhook_id: snowflake(row, "webhook_id"),
        webhook_channel: snowflake(row, "webhook_channel"),
        webhook_token: row.get("webhook_token"),
        member_join: row.get("member_join"),
        member_leave: row.get("member_leave"),
        member_ban: row.get("member_ban"),
        member_unban: row.get("member_unban"),
        member_rename: row.get("member_rename"),
        member_role_change: row.get("member_role_change"),
        message_edit: row.get("message_edit"),
        message_delete: row.get("message_delete"),
    })
}

fn category_rule(row: &SqliteRow, prefix: &str) -> Result<CategoryRule, ConfigError> {
    let action_raw: String = row.get(format!("{prefix}_action").as_str());
    let action = AutomodAction::from_name(&action_raw)
        .ok_or_else(|| storage_err(format!("unknown automod action '{action_raw}'")))?;

    Ok(CategoryRule {
        action,
        whitelist_channels: id_list(row, &format!("{prefix}_whitelist_channels"))?,
        whitelist_roles: id_list(row, &format!("{prefix}_whitelist_roles"))?,
        points: row.get::<i64, _>(format!("{prefix}_points").as_str()) as u16,
    })
}

fn row_to_moderation(row: &SqliteRow) -> Result<ModerationConfig, ConfigError> {
    let final_raw: String = row.get("automod_action");
    let automod_action = AutomodFinalAction::from_name(&final_raw)
        .ok_or_else(|| storage_err(format!("unknown automod final action '{final_raw}'")))?;

    let settings_raw: String = row.get("mention_settings");
    let mention_settings = MentionSettings::from_name(&settings_raw)
        .ok_or_else(|| storage_err(format!("unknown mention settings '{settings_raw}'")))?;

    Ok(ModerationConfig {
        guild_id: row.get::<i64, _>("id") as u64,
        mod_roles: id_list(row, "mod_roles")?,
        ignored_roles: id_list(row, "ignored_roles")?,
        mute_role: snowflake(row, "mute_role"),
        log_channel: snowflake(row, "log_channel"),
        ban_time: row.get::<i64, _>("ban_time") as u32,
        mute_time: row.get::<i64, _>("mute_time") as u32,
        active: row.get("active"),
        automod_action,
        notify_user: row.get("notify_user"),
        invite: category_rule(row, "invite")?,
        invite_allowed: string_list(row, "invite_allowed")?,
        link: category_rule(row, "link")?,
        link_list: string_list(row, "link_list")?,
        link_is_whitelist: row.get("link_is_whitelist"),
        mention: category_rule(row, "mention")?,
        mention_settings,
        mention_count: row.get::<i64, _>("mention_count") as u16,
        caps: category_rule(row, "caps")?,
    })
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get_leveling(&self, guild_id: u64) -> Result<Option<LevelingConfig>, ConfigError> {
        let row = sqlx::query("SELECT * FROM leveling WHERE id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.as_ref().map(row_to_leveling).transpose()
    }

    async fn upsert_leveling(&self, config: &LevelingConfig) -> Result<(), ConfigError> {
        sqlx::query(
            r#"
            INSERT INTO leveling (id, active, channel, message, roles, no_xp_channels, no_xp_role, remove_roles)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                active = excluded.active,
                channel = excluded.channel,
                message = excluded.message,
                roles = excluded.roles,
                no_xp_channels = excluded.no_xp_channels,
                no_xp_role = excluded.no_xp_role,
                remove_roles = excluded.remove_roles
            "#,
        )
        .bind(config.guild_id as i64)
        .bind(config.active)
        .bind(config.channel.map(|v| v as i64))
        .bind(config.message.as_deref())
        .bind(encode_ids(&config.roles)?)
        .bind(encode_ids(&config.no_xp_channels)?)
        .bind(config.no_xp_role.map(|v| v as i64))
        .bind(config.remove_roles)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_welcome(&self, guild_id: u64) -> Result<Option<WelcomeConfig>, ConfigError> {
        let row = sqlx::query("SELECT * FROM welcome WHERE id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.as_ref().map(row_to_welcome).transpose()
    }

    async fn upsert_welcome(&self, config: &WelcomeConfig) -> Result<(), ConfigError> {
        sqlx::query(
            r#"
            INSERT INTO welcome (
                id, active, join_channel, join_message, join_roles, join_active,
                leave_channel, leave_message, leave_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                active = excluded.active,
                join_channel = excluded.join_channel,
                join_message = excluded.join_message,
                join_roles = excluded.join_roles,
                join_active = excluded.join_active,
                leave_channel = excluded.leave_channel,
                leave_message = excluded.leave_message,
                leave_active = excluded.leave_active
            "#,
        )
        .bind(config.guild_id as i64)
        .bind(config.active)
        .bind(config.join_channel.map(|v| v as i64))
        .bind(config.join_message.as_deref())
        .bind(encode_ids(&config.join_roles)?)
        .bind(config.join_active)
        .bind(config.leave_channel.map(|v| v as i64))
        .bind(config.leave_message.as_deref())
        .bind(config.leave_active)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_logging(&self, guild_id: u64) -> Result<Option<LoggingConfig>, ConfigError> {
        let row = sqlx::query("SELECT * FROM logging WHERE id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.as_ref().map(row_to_logging).transpose()
    }

    async fn upsert_logging(&self, config: &LoggingConfig) -> Result<(), ConfigError> {
        sqlx::query(
            r#"
            INSERT INTO logging (
                id, active, webhook_id, webhook_channel, webhook_token,
                member_join, member_leave, member_ban, member_unban,
                member_rename, member_role_change, message_edit, message_delete
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                active = excluded.active,
                webhook_id = excluded.webhook_id,
                webhook_channel = excluded.webhook_channel,
                webhook_token = excluded.webhook_token,
                member_join = excluded.member_join,
                member_leave = excluded.member_leave,
                member_ban = excluded.member_ban,
                member_unban = excluded.member_unban,
                member_rename = excluded.member_rename,
                member_role_change = excluded.member_role_change,
                message_edit = excluded.message_edit,
                message_delete = excluded.message_delete
            "#,
        )
        .bind(config.guild_id as i64)
        .bind(config.active)
        .bind(config.webhook_id.map(|v| v as i64))
        .bind(config.webhook_channel.map(|v| v as i64))
        .bind(config.webhook_token.as_deref())
        .bind(config.member_join)
        .bind(config.member_leave)
        .bind(config.member_ban)
        .bind(config.member_unban)
        .bind(config.member_rename)
        .bind(config.member_role_change)
        .bind(config.message_edit)
        .bind(config.message_delete)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_moderation(&self, guild_id: u64) -> Result<Option<ModerationConfig>, ConfigError> {
        let row = sqlx::query("SELECT * FROM moderation WHERE id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.as_ref().map(row_to_moderation).transpose()
    }

    async fn upsert_moderation(&self, config: &ModerationConfig) -> Result<(), ConfigError> {
        sqlx::query(
            r#"
            INSERT INTO moderation (
                id, mod_roles, ignored_roles, mute_role, log_channel,
                ban_time, mute_time, active, automod_action, notify_user,
                invite_action, invite_whitelist_channels, invite_whitelist_roles,
                invite_allowed, invite_points,
                link_action, link_whitelist_channels, link_whitelist_roles,
                link_list, link_points, link_is_whitelist,
                mention_action, mention_whitelist_channels, mention_whitelist_roles,
                mention_settings, mention_count, mention_points,
                caps_action, caps_whitelist_channels, caps_whitelist_roles, caps_points
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                mod_roles = excluded.mod_roles,
                ignored_roles = excluded.ignored_roles,
                mute_role = excluded.mute_role,
                log_channel = excluded.log_channel,
                ban_time = excluded.ban_time,
                mute_time = excluded.mute_time,
                active = excluded.active,
                automod_action = excluded.automod_action,
                notify_user = excluded.notify_user,
                invite_action = excluded.invite_action,
                invite_whitelist_channels = excluded.invite_whitelist_channels,
                invite_whitelist_roles = excluded.invite_whitelist_roles,
                invite_allowed = excluded.invite_allowed,
                invite_points = excluded.invite_points,
                link_action = excluded.link_action,
                link_whitelist_channels = excluded.link_whitelist_channels,
                link_whitelist_roles = excluded.link_whitelist_roles,
                link_list = excluded.link_list,
                link_points = excluded.link_points,
                link_is_whitelist = excluded.link_is_whitelist,
                mention_action = excluded.mention_action,
                mention_whitelist_channels = excluded.mention_whitelist_channels,
                mention_whitelist_roles = excluded.mention_whitelist_roles,
                mention_settings = excluded.mention_settings,
                mention_count = excluded.mention_count,
                mention_points = excluded.mention_points,
                caps_action = excluded.caps_action,
                caps_whitelist_channels = excluded.caps_whitelist_channels,
                caps_whitelist_roles = excluded.caps_whitelist_roles,
                caps_points = excluded.caps_points
            "#,
        )
        .bind(config.guild_id as i64)
        .bind(encode_ids(&config.mod_roles)?)
        .bind(encode_ids(&config.ignored_roles)?)
        .bind(config.mute_role.map(|v| v as i64))
        .bind(config.log_channel.map(|v| v as i64))
        .bind(config.ban_time as i64)
        .bind(config.mute_time as i64)
        .bind(config.active)
        .bind(config.automod_action.as_str())
        .bind(config.notify_user)
        .bind(config.invite.action.as_str())
        .bind(encode_ids(&config.invite.whitelist_channels)?)
        .bind(encode_ids(&config.invite.whitelist_roles)?)
        .bind(encode_strings(&config.invite_allowed)?)
        .bind(config.invite.points as i64)
        .bind(config.link.action.as_str())
        .bind(encode_ids(&config.link.whitelist_channels)?)
        .bind(encode_ids(&config.link.whitelist_roles)?)
        .bind(encode_strings(&config.link_list)?)
        .bind(config.link.points as i64)
        .bind(config.link_is_whitelist)
        .bind(config.mention.action.as_str())
        .bind(encode_ids(&config.mention.whitelist_channels)?)
        .bind(encode_ids(&config.mention.whitelist_roles)?)
        .bind(config.mention_settings.as_str())
        .bind(config.mention_count as i64)
        .bind(config.mention.points as i64)
        .bind(config.caps.action.as_str())
        .bind(encode_ids(&config.caps.whitelist_channels)?)
        .bind(encode_ids(&config.caps.whitelist_roles)?)
        .bind(config.caps.points as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_xp(&self, guild_id: u64, user_id: u64) -> Result<u64, ConfigError> {
        let row = sqlx::query("SELECT xp FROM leveling_users WHERE guild_id = ? AND user_id = ?")
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.map(|r| r.get::<i64, _>(0) as u64).unwrap_or(0))
    }

    async fn add_xp(&self, guild_id: u64, user_id: u64, amount: u64) -> Result<u64, ConfigError> {
        sqlx::query(
            r#"
            INSERT INTO leveling_users (guild_id, user_id, xp)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id, user_id) DO UPDATE SET
                xp = xp + excluded.xp
            "#,
        )
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .bind(amount as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        self.get_xp(guild_id, user_id).await
    }

    async fn top_users(&self, guild_id: u64, limit: u32) -> Result<Vec<LevelingUser>, ConfigError> {
        let rows = sqlx::query(
            "SELECT guild_id, user_id, xp FROM leveling_users WHERE guild_id = ? ORDER BY xp DESC LIMIT ?",
        )
        .bind(guild_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|row| LevelingUser {
                guild_id: row.get::<i64, _>("guild_id") as u64,
                user_id: row.get::<i64, _>("user_id") as u64,
                xp: row.get::<i64, _>("xp") as u64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AutomodCategory;
    use tempfile::TempDir;

    const GUILD: u64 = 424242;

    async fn temp_store() -> (TempDir, SqliteConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palisade.db");
        let store = SqliteConfigStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn missing_guild_has_no_config() {
        let (_dir, store) = temp_store().await;
        assert!(store.get_leveling(GUILD).await.unwrap().is_none());
        assert!(store.get_moderation(GUILD).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn leveling_config_round_trips() {
        let (_dir, store) = temp_store().await;

        let mut config = LevelingConfig::new(GUILD);
        config.active = true;
        config.channel = Some(111);
        config.message = Some("GG {user}, level {level}!".to_string());
        config.roles = vec![1, 2, 3];
        config.no_xp_channels = vec![9];

        store.upsert_leveling(&config).await.unwrap();
        let loaded = store.get_leveling(GUILD).await.unwrap().unwrap();
        assert_eq!(loaded, config);

        // Second upsert updates in place.
        config.active = false;
        store.upsert_leveling(&config).await.unwrap();
        let loaded = store.get_leveling(GUILD).await.unwrap().unwrap();
        assert!(!loaded.active);
    }

    #[tokio::test]
    async fn welcome_and_logging_round_trip() {
        let (_dir, store) = temp_store().await;

        let mut welcome = WelcomeConfig::new(GUILD);
        welcome.active = true;
        welcome.join_active = true;
        welcome.join_channel = Some(5);
        welcome.join_roles = vec![10, 20];
        store.upsert_welcome(&welcome).await.unwrap();
        assert_eq!(store.get_welcome(GUILD).await.unwrap().unwrap(), welcome);

        let mut logging = LoggingConfig::new(GUILD);
        logging.active = true;
        logging.webhook_id = Some(77);
        logging.webhook_token = Some("token".to_string());
        logging.message_delete = true;
        store.upsert_logging(&logging).await.unwrap();
        assert_eq!(store.get_logging(GUILD).await.unwrap().unwrap(), logging);
    }

    #[tokio::test]
    async fn moderation_config_round_trips_enums_and_lists() {
        let (_dir, store) = temp_store().await;

        let mut config = ModerationConfig::new(GUILD);
        config.active = true;
        config.automod_action = AutomodFinalAction::Tempmute;
        config.mention_settings = MentionSettings::IncludeAll;
        config.mod_roles = vec![100, 200];
        config.invite_allowed = vec!["friends".to_string()];
        config.link_list = vec!["example.com".to_string()];
        config.rule_mut(AutomodCategory::Invite).action = AutomodAction::Kick;
        config.rule_mut(AutomodCategory::Invite).points = 3;
        config.rule_mut(AutomodCategory::Caps).whitelist_channels = vec![555];

        store.upsert_moderation(&config).await.unwrap();
        let loaded = store.get_moderation(GUILD).await.unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn xp_accumulates_in_a_single_row() {
        let (_dir, store) = temp_store().await;

        assert_eq!(store.get_xp(GUILD, 1).await.unwrap(), 0);
        assert_eq!(store.add_xp(GUILD, 1, 20).await.unwrap(), 20);
        assert_eq!(store.add_xp(GUILD, 1, 15).await.unwrap(), 35);
        store.add_xp(GUILD, 2, 50).await.unwrap();

        let top = store.top_users(GUILD, 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user_id, 2);
        assert_eq!(top[0].xp, 50);
        assert_eq!(top[1].user_id, 1);
        assert_eq!(top[1].xp, 35);

        // Other guilds are not visible.
        assert!(store.top_users(GUILD + 1, 10).await.unwrap().is_empty());
    }
}
