// Column and table descriptors - plain data structures, no ORM magic.
//
// A table is declared as a list of `ColumnSpec`s. `ColumnSpec::finalize`
// normalizes each declaration (nullability, default literal) before the
// persistence layer renders it into CREATE TABLE statements.

/// SQL-facing type of a column.
///
/// List-typed columns are stored as JSON text, enumerations as TEXT whose
/// values are the member names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit integer: snowflake ids, durations in seconds.
    BigInt,
    Integer,
    SmallInt,
    Boolean,
    Text { limit: Option<u32> },
    /// JSON-encoded array of snowflake ids.
    BigIntList,
    /// JSON-encoded array of strings.
    TextList { limit: Option<u32> },
    /// TEXT column holding one of the given member names.
    Enumeration { members: &'static [&'static str] },
}

impl ColumnType {
    /// SQLite storage type for this descriptor.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::BigInt | ColumnType::Integer | ColumnType::SmallInt => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text { .. } => "TEXT",
            ColumnType::BigIntList | ColumnType::TextList { .. } => "TEXT",
            ColumnType::Enumeration { .. } => "TEXT",
        }
    }
}

/// Declared default for a column, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Text(&'static str),
    /// An enum member; the stored literal is the member's name.
    Enum(&'static str),
    /// A list default. The declared contents are irrelevant: every
    /// list-typed default collapses to the empty JSON array.
    List(Vec<String>),
}

impl DefaultValue {
    /// The SQL literal this default normalizes to.
    ///
    /// Enums serialize to their member name, lists to the empty-array
    /// token `'[]'`, everything else to its backend string form.
    pub fn literal(&self) -> String {
        match self {
            DefaultValue::Bool(true) => "1".to_string(),
            DefaultValue::Bool(false) => "0".to_string(),
            DefaultValue::Int(value) => value.to_string(),
            DefaultValue::Text(value) => format!("'{}'", value),
            DefaultValue::Enum(member) => format!("'{}'", member),
            DefaultValue::List(_) => "'[]'".to_string(),
        }
    }
}

/// Column specification as written in the registry.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
    pub default: Option<DefaultValue>,
    /// Explicit nullability. When absent, `finalize` derives it.
    pub nullable: Option<bool>,
    pub primary_key: bool,
    pub autoincrement: bool,
}

impl ColumnSpec {
    pub fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            default: None,
            nullable: None,
            primary_key: false,
            autoincrement: false,
        }
    }

    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Normalize the spec into a finalized column.
    ///
    /// A declared default forces NOT NULL unless nullability was set
    /// explicitly. Columns without a default stay nullable unless they are
    /// part of the primary key.
    pub fn finalize(&self) -> Column {
        let nullable = match self.nullable {
            Some(explicit) => explicit,
            None => self.default.is_none() && !self.primary_key,
        };

        Column {
            name: self.name,
            ty: self.ty.clone(),
            default_literal: self.default.as_ref().map(DefaultValue::literal),
            nullable,
            primary_key: self.primary_key,
            autoincrement: self.autoincrement,
        }
    }
}

/// Finalized column, ready for SQL rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub default_literal: Option<String>,
    pub nullable: bool,
    pub primary_key: bool,
    pub autoincrement: bool,
}

impl Column {
    fn render(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.ty.sql_type());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(literal) = &self.default_literal {
            sql.push_str(" DEFAULT ");
            sql.push_str(literal);
        }
        sql
    }
}

/// A table declaration: name, columns, composite unique constraints.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
    pub uniques: Vec<&'static [&'static str]>,
}

impl TableSpec {
    pub fn new(name: &'static str, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name,
            columns,
            uniques: Vec::new(),
        }
    }

    pub fn unique(mut self, columns: &'static [&'static str]) -> Self {
        self.uniques.push(columns);
        self
    }

    pub fn finalized_columns(&self) -> Vec<Column> {
        self.columns.iter().map(ColumnSpec::finalize).collect()
    }

    /// Render the idempotent CREATE TABLE statement for this table.
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .finalized_columns()
            .iter()
            .map(Column::render)
            .collect();

        for unique in &self.uniques {
            parts.push(format!("UNIQUE ({})", unique.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            parts.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_forces_not_null() {
        let column = ColumnSpec::new("active", ColumnType::Boolean)
            .default(DefaultValue::Bool(false))
            .finalize();

        assert!(!column.nullable);
        assert_eq!(column.default_literal.as_deref(), Some("0"));
    }

    #[test]
    fn explicit_nullability_wins_over_default() {
        let column = ColumnSpec::new("channel", ColumnType::BigInt)
            .default(DefaultValue::Int(0))
            .nullable(true)
            .finalize();

        assert!(column.nullable);
    }

    #[test]
    fn column_without_default_stays_nullable() {
        let column = ColumnSpec::new("channel", ColumnType::BigInt).finalize();
        assert!(column.nullable);
        assert_eq!(column.default_literal, None);
    }

    #[test]
    fn enum_default_uses_member_name() {
        let column = ColumnSpec::new(
            "automod_action",
            ColumnType::Enumeration {
                members: &["none", "kick"],
            },
        )
        .default(DefaultValue::Enum("none"))
        .finalize();

        assert_eq!(column.default_literal.as_deref(), Some("'none'"));
    }

    #[test]
    fn list_default_collapses_to_empty_array() {
        // Even a non-empty declared list normalizes to the empty token.
        let column = ColumnSpec::new("join_roles", ColumnType::BigIntList)
            .default(DefaultValue::List(vec![
                "1234".to_string(),
                "5678".to_string(),
            ]))
            .finalize();

        assert_eq!(column.default_literal.as_deref(), Some("'[]'"));
    }

    #[test]
    fn scalar_defaults_use_string_form() {
        assert_eq!(DefaultValue::Int(86400).literal(), "86400");
        assert_eq!(DefaultValue::Bool(true).literal(), "1");
        assert_eq!(DefaultValue::Text("hello").literal(), "'hello'");
    }

    #[test]
    fn create_sql_renders_keys_and_constraints() {
        let table = TableSpec::new(
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
        .unique(&["guild_id", "user_id"]);

        let sql = table.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS leveling_users ("));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("guild_id INTEGER NOT NULL"));
        assert!(sql.contains("xp INTEGER NOT NULL DEFAULT 0"));
        assert!(sql.contains("UNIQUE (guild_id, user_id)"));
    }
}
