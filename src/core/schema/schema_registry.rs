// The schema registry: one TableSpec per guild configuration entity.
// `SqliteConfigStore::migrate` executes these in order.

use super::schema_models::{ColumnSpec, ColumnType, DefaultValue, TableSpec};
use crate::core::config::{AutomodAction, AutomodFinalAction, MentionSettings};

fn leveling_table() -> TableSpec {
    TableSpec::new(
        "leveling",
        vec![
            ColumnSpec::new("id", ColumnType::BigInt).primary_key(),
            ColumnSpec::new("active", ColumnType::Boolean).default(DefaultValue::Bool(false)),
            ColumnSpec::new("channel", ColumnType::BigInt),
            ColumnSpec::new("message", ColumnType::Text { limit: Some(2000) }),
            ColumnSpec::new("roles", ColumnType::BigIntList),
            ColumnSpec::new("no_xp_channels", ColumnType::BigIntList),
            ColumnSpec::new("no_xp_role", ColumnType::BigInt),
            ColumnSpec::new("remove_roles", ColumnType::Boolean).default(DefaultValue::Bool(false)),
        ],
    )
}

fn leveling_users_table() -> TableSpec {
    TableSpec::new(
        "leveling_users",
        vec![
            ColumnSpec::new("id", ColumnType::Integer)
                .primary_key()
                .autoincrement(),
            ColumnSpec::new("guild_id", ColumnType::BigInt).nullable(false),
            ColumnSpec::new("user_id", ColumnType::BigInt).nullable(false),
            ColumnSpec::new("xp", ColumnType::Integer).default(DefaultValue::Int(0)),
        ],
    )
    .unique(&["guild_id", "user_id"])
}

fn welcome_table() -> TableSpec {
    TableSpec::new(
        "welcome",
        vec![
            ColumnSpec::new("id", ColumnType::BigInt).primary_key(),
            ColumnSpec::new("active", ColumnType::Boolean).default(DefaultValue::Bool(false)),
            ColumnSpec::new("join_channel", ColumnType::BigInt),
            ColumnSpec::new("join_message", ColumnType::Text { limit: Some(2000) }),
            ColumnSpec::new("join_roles", ColumnType::BigIntList)
                .default(DefaultValue::List(Vec::new())),
            ColumnSpec::new("join_active", ColumnType::Boolean).default(DefaultValue::Bool(false)),
            ColumnSpec::new("leave_channel", ColumnType::BigInt),
            ColumnSpec::new("leave_message", ColumnType::Text { limit: Some(2000) }),
            ColumnSpec::new("leave_active", ColumnType::Boolean).default(DefaultValue::Bool(false)),
        ],
    )
}

fn logging_table() -> TableSpec {
    let mut columns = vec![
        ColumnSpec::new("id", ColumnType::BigInt).primary_key(),
        ColumnSpec::new("active", ColumnType::Boolean).default(DefaultValue::Bool(false)),
        ColumnSpec::new("webhook_id", ColumnType::BigInt),
        ColumnSpec::new("webhook_channel", ColumnType::BigInt),
        ColumnSpec::new("webhook_token", ColumnType::Text { limit: Some(80) }),
    ];

    // One independently-defaulted flag per loggable event type.
    for flag in [
        "member_join",
        "member_leave",
        "member_ban",
        "member_unban",
        "member_rename",
        "member_role_change",
        "message_edit",
        "message_delete",
    ] {
        columns.push(ColumnSpec::new(flag, ColumnType::Boolean).default(DefaultValue::Bool(false)));
    }

    TableSpec::new("logging", columns)
}

fn moderation_table() -> TableSpec {
    let automod_action = || ColumnType::Enumeration {
        members: AutomodAction::MEMBERS,
    };

    TableSpec::new(
        "moderation",
        vec![
            ColumnSpec::new("id", ColumnType::BigInt).primary_key(),
            ColumnSpec::new("mod_roles", ColumnType::BigIntList),
            ColumnSpec::new("ignored_roles", ColumnType::BigIntList),
            ColumnSpec::new("mute_role", ColumnType::BigInt),
            ColumnSpec::new("log_channel", ColumnType::BigInt),
            ColumnSpec::new("ban_time", ColumnType::Integer).default(DefaultValue::Int(86400)),
            ColumnSpec::new("mute_time", ColumnType::Integer).default(DefaultValue::Int(86400)),
            ColumnSpec::new("active", ColumnType::Boolean).default(DefaultValue::Bool(false)),
            ColumnSpec::new(
                "automod_action",
                ColumnType::Enumeration {
                    members: AutomodFinalAction::MEMBERS,
                },
            )
            .default(DefaultValue::Enum(AutomodFinalAction::None.as_str())),
            ColumnSpec::new("notify_user", ColumnType::Boolean).default(DefaultValue::Bool(true)),
            ColumnSpec::new("invite_action", automod_action())
                .default(DefaultValue::Enum(AutomodAction::None.as_str())),
            ColumnSpec::new("invite_whitelist_channels", ColumnType::BigIntList),
            ColumnSpec::new("invite_whitelist_roles", ColumnType::BigIntList),
            ColumnSpec::new("invite_allowed", ColumnType::TextList { limit: Some(10) }),
            ColumnSpec::new("invite_points", ColumnType::SmallInt).default(DefaultValue::Int(1)),
            ColumnSpec::new("link_action", automod_action())
                .default(DefaultValue::Enum(AutomodAction::None.as_str())),
            ColumnSpec::new("link_whitelist_channels", ColumnType::BigIntList),
            ColumnSpec::new("link_whitelist_roles", ColumnType::BigIntList),
            ColumnSpec::new("link_list", ColumnType::TextList { limit: Some(30) }),
            ColumnSpec::new("link_points", ColumnType::SmallInt).default(DefaultValue::Int(1)),
            ColumnSpec::new("link_is_whitelist", ColumnType::Boolean)
                .default(DefaultValue::Bool(true)),
            ColumnSpec::new("mention_action", automod_action())
                .default(DefaultValue::Enum(AutomodAction::None.as_str())),
            ColumnSpec::new("mention_whitelist_channels", ColumnType::BigIntList),
            ColumnSpec::new("mention_whitelist_roles", ColumnType::BigIntList),
            ColumnSpec::new(
                "mention_settings",
                ColumnType::Enumeration {
                    members: MentionSettings::MEMBERS,
                },
            )
            .default(DefaultValue::Enum(MentionSettings::Member.as_str())),
            ColumnSpec::new("mention_count", ColumnType::SmallInt).default(DefaultValue::Int(5)),
            ColumnSpec::new("mention_points", ColumnType::SmallInt).default(DefaultValue::Int(1)),
            ColumnSpec::new("caps_action", automod_action())
                .default(DefaultValue::Enum(AutomodAction::None.as_str())),
            ColumnSpec::new("caps_whitelist_channels", ColumnType::BigIntList),
            ColumnSpec::new("caps_whitelist_roles", ColumnType::BigIntList),
            ColumnSpec::new("caps_points", ColumnType::SmallInt).default(DefaultValue::Int(1)),
        ],
    )
}

/// Every guild configuration table, in creation order.
pub fn guild_tables() -> Vec<TableSpec> {
    vec![
        leveling_table(),
        leveling_users_table(),
        welcome_table(),
        logging_table(),
        moderation_table(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_all_tables() {
        let names: Vec<&str> = guild_tables().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "leveling",
                "leveling_users",
                "welcome",
                "logging",
                "moderation"
            ]
        );
    }

    #[test]
    fn every_defaulted_column_is_not_nullable() {
        for table in guild_tables() {
            for column in table.finalized_columns() {
                if column.default_literal.is_some() {
                    assert!(
                        !column.nullable,
                        "{}.{} has a default but is nullable",
                        table.name, column.name
                    );
                }
            }
        }
    }

    #[test]
    fn moderation_defaults_render_expected_literals() {
        let table = moderation_table();
        let columns = table.finalized_columns();

        let literal = |name: &str| {
            columns
                .iter()
                .find(|c| c.name == name)
                .and_then(|c| c.default_literal.clone())
        };

        assert_eq!(literal("ban_time").as_deref(), Some("86400"));
        assert_eq!(literal("automod_action").as_deref(), Some("'none'"));
        assert_eq!(literal("invite_action").as_deref(), Some("'none'"));
        assert_eq!(literal("mention_settings").as_deref(), Some("'member'"));
        assert_eq!(literal("notify_user").as_deref(), Some("1"));
        // Whitelist lists have no default and stay nullable.
        assert_eq!(literal("invite_whitelist_channels"), None);
    }

    #[test]
    fn welcome_join_roles_defaults_to_empty_array() {
        let table = welcome_table();
        let join_roles = table
            .finalized_columns()
            .into_iter()
            .find(|c| c.name == "join_roles")
            .unwrap();

        assert_eq!(join_roles.default_literal.as_deref(), Some("'[]'"));
        assert!(!join_roles.nullable);
    }

    #[test]
    fn leveling_users_pair_is_unique() {
        let table = leveling_users_table();
        assert_eq!(table.uniques, vec![&["guild_id", "user_id"][..]]);
    }

    #[test]
    fn create_sql_is_renderable_for_every_table() {
        for table in guild_tables() {
            let sql = table.create_sql();
            assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"));
            assert!(sql.contains(table.name));
        }
    }
}
