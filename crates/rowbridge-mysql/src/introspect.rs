//! Live schema introspection.
//!
//! Columns are read from `INFORMATION_SCHEMA.COLUMNS` and unique indexes
//! from `INFORMATION_SCHEMA.STATISTICS`, then converted into
//! [`LiveColumn`]s in the same canonical form the normalizer produces for
//! entity columns.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use rowbridge_core::normalize::data_type_defaults;
use rowbridge_core::{Flavor, LiveColumn, MysqlDriver, TablePath};
use sqlx::mysql::MySqlPool;
use tracing::debug;

use crate::error::{IntrospectError, Result};

static CURRENT_TIMESTAMP_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CURRENT_TIMESTAMP(\(\d*\))?$").expect("timestamp default pattern is valid")
});

/// Query for the columns of one table, in ordinal order.
pub const COLUMNS_SQL: &str = r"
SELECT
    CAST(COLUMN_NAME AS CHAR),
    CAST(DATA_TYPE AS CHAR),
    CAST(COLUMN_TYPE AS CHAR),
    CAST(IS_NULLABLE AS CHAR),
    CAST(COLUMN_DEFAULT AS CHAR),
    CAST(COLUMN_KEY AS CHAR),
    CAST(EXTRA AS CHAR),
    CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED),
    CAST(NUMERIC_PRECISION AS SIGNED),
    CAST(NUMERIC_SCALE AS SIGNED),
    CAST(DATETIME_PRECISION AS SIGNED),
    CAST(COLUMN_COMMENT AS CHAR),
    CAST(GENERATION_EXPRESSION AS CHAR)
FROM INFORMATION_SCHEMA.COLUMNS
WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
ORDER BY ORDINAL_POSITION
";

/// Query for the index memberships of one table.
pub const INDEXES_SQL: &str = r"
SELECT
    CAST(INDEX_NAME AS CHAR),
    CAST(COLUMN_NAME AS CHAR),
    CAST(NON_UNIQUE AS SIGNED)
FROM INFORMATION_SCHEMA.STATISTICS
WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
ORDER BY INDEX_NAME, SEQ_IN_INDEX
";

/// Types whose length the server reports even when left at its default,
/// because the entity side assumes the same default.
const KEPT_DEFAULT_LENGTH_TYPES: &[&str] = &["varchar", "nvarchar", "national varchar", "varbinary"];

const LENGTH_TYPES: &[&str] = &[
    "char",
    "nchar",
    "national char",
    "varchar",
    "nvarchar",
    "national varchar",
    "binary",
    "varbinary",
];

const WIDTH_TYPES: &[&str] = &["bit", "tinyint", "smallint", "mediumint", "int", "integer", "bigint"];

const PRECISION_TYPES: &[&str] = &["decimal", "double", "float"];

const TEMPORAL_PRECISION_TYPES: &[&str] = &["datetime", "time", "timestamp"];

// ================================================================
// Raw rows
// ================================================================

type ColumnTuple = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
);

/// One row of `INFORMATION_SCHEMA.COLUMNS`; fields are named after the
/// columns they hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRow {
    pub column_name: String,
    pub data_type: String,
    pub column_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
    pub column_key: String,
    pub extra: String,
    pub character_maximum_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub datetime_precision: Option<i64>,
    pub column_comment: Option<String>,
    pub generation_expression: Option<String>,
}

impl From<ColumnTuple> for ColumnRow {
    fn from(row: ColumnTuple) -> Self {
        let (
            column_name,
            data_type,
            column_type,
            is_nullable,
            column_default,
            column_key,
            extra,
            character_maximum_length,
            numeric_precision,
            numeric_scale,
            datetime_precision,
            column_comment,
            generation_expression,
        ) = row;
        Self {
            column_name,
            data_type,
            column_type,
            is_nullable,
            column_default,
            column_key,
            extra,
            character_maximum_length,
            numeric_precision,
            numeric_scale,
            datetime_precision,
            column_comment,
            generation_expression,
        }
    }
}

/// One row of `INFORMATION_SCHEMA.STATISTICS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    /// Index name; `PRIMARY` for the primary key.
    pub index_name: String,
    /// Indexed column; `None` for functional key parts.
    pub column_name: Option<String>,
    /// Whether the index allows duplicates.
    pub non_unique: bool,
}

// ================================================================
// Conversion
// ================================================================

/// Returns the columns that are the sole column of a unique, non-primary
/// index.
#[must_use]
pub fn unique_columns(indexes: &[IndexRow]) -> BTreeSet<String> {
    let mut by_index: BTreeMap<&str, Vec<Option<&str>>> = BTreeMap::new();
    for row in indexes
        .iter()
        .filter(|row| !row.non_unique && row.index_name != "PRIMARY")
    {
        by_index
            .entry(row.index_name.as_str())
            .or_default()
            .push(row.column_name.as_deref());
    }
    by_index
        .into_values()
        .filter_map(|columns| match columns.as_slice() {
            [Some(column)] => Some((*column).to_string()),
            _ => None,
        })
        .collect()
}

/// Converts a `COLUMNS` row into a [`LiveColumn`].
///
/// # Errors
///
/// Returns [`IntrospectError::MalformedColumnType`] when the member list of
/// an `enum` or `set` column cannot be parsed.
pub fn live_column(row: &ColumnRow, unique: &BTreeSet<String>, flavor: Flavor) -> Result<LiveColumn> {
    let column_type = row.data_type.to_lowercase();
    let raw_type = row.column_type.to_lowercase();
    let zerofill = raw_type.contains("zerofill");
    let defaults = data_type_defaults(&column_type).unwrap_or_default();

    let mut live = LiveColumn {
        name: row.column_name.clone(),
        zerofill,
        unsigned: zerofill || raw_type.contains("unsigned"),
        is_nullable: row.is_nullable == "YES",
        is_primary: row.column_key == "PRI",
        is_unique: unique.contains(&row.column_name),
        is_generated: row.extra.contains("auto_increment"),
        default: live_default(row.column_default.as_deref(), flavor),
        comment: row.column_comment.clone().filter(|c| !c.is_empty()),
        on_update: on_update(&row.extra),
        ..LiveColumn::default()
    };

    if WIDTH_TYPES.contains(&column_type.as_str()) {
        live.width = display_width(&raw_type)
            .filter(|width| Some(*width) != default_width(&column_type, live.unsigned));
    }

    if LENGTH_TYPES.contains(&column_type.as_str()) {
        if let Some(length) = row.character_maximum_length.and_then(|l| u32::try_from(l).ok()) {
            let omitted = defaults.length == Some(length)
                && !KEPT_DEFAULT_LENGTH_TYPES.contains(&column_type.as_str());
            if !omitted {
                live.length = length.to_string();
            }
        }
    }

    if PRECISION_TYPES.contains(&column_type.as_str()) {
        live.precision = to_u32(row.numeric_precision);
        live.scale = to_u32(row.numeric_scale);
    }

    if TEMPORAL_PRECISION_TYPES.contains(&column_type.as_str()) {
        live.precision = to_u32(row.datetime_precision);
    }

    if matches!(column_type.as_str(), "enum" | "set") {
        let members = enum_members(&row.column_type).ok_or_else(|| {
            IntrospectError::MalformedColumnType {
                column: row.column_name.clone(),
                column_type: row.column_type.clone(),
            }
        })?;
        live.enum_values = Some(members);
        live.length = String::new();
    }

    if let Some(expression) = row.generation_expression.as_deref().filter(|e| !e.is_empty()) {
        live.as_expression = Some(expression.to_string());
        live.generated_type = Some(
            if row.extra.to_uppercase().contains("VIRTUAL") {
                "VIRTUAL"
            } else {
                "STORED"
            }
            .to_string(),
        );
    }

    live.column_type = column_type;
    Ok(live)
}

/// Normalizes a `COLUMN_DEFAULT` value.
///
/// MariaDB reports an explicit `NULL` default as the text `NULL` and
/// quotes literals itself; MySQL reports literals bare.
#[must_use]
pub fn live_default(default: Option<&str>, flavor: Flavor) -> Option<String> {
    let default = default?;
    if flavor == Flavor::Mariadb && default == "NULL" {
        return None;
    }
    if CURRENT_TIMESTAMP_DEFAULT.is_match(default) {
        return Some(default.to_uppercase());
    }
    match flavor {
        Flavor::Mariadb => Some(default.to_string()),
        Flavor::Mysql => Some(format!("'{default}'")),
    }
}

fn on_update(extra: &str) -> Option<String> {
    let lower = extra.to_lowercase();
    let start = lower.find("on update ")? + "on update ".len();
    Some(extra[start..].trim().to_uppercase())
}

fn display_width(raw_type: &str) -> Option<u32> {
    let open = raw_type.find('(')?;
    let close = raw_type[open..].find(')')? + open;
    raw_type[open + 1..close].trim().parse().ok()
}

fn default_width(column_type: &str, unsigned: bool) -> Option<u32> {
    let width = data_type_defaults(column_type)?.width?;
    let signed_only = matches!(column_type, "tinyint" | "smallint" | "mediumint" | "int" | "integer");
    Some(if unsigned && signed_only { width - 1 } else { width })
}

fn to_u32(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

/// Parses the members out of `enum('a','b')` / `set('a','b')`.
///
/// Doubled quotes inside a member stand for one quote.
fn enum_members(column_type: &str) -> Option<Vec<String>> {
    let open = column_type.find('(')?;
    let close = column_type.rfind(')')?;
    if close <= open {
        return None;
    }
    let body = &column_type[open + 1..close];

    let mut members = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        match chars.next() {
            None => break,
            Some(',' | ' ') => {}
            Some('\'') => {
                let mut member = String::new();
                loop {
                    match chars.next()? {
                        '\'' if chars.peek() == Some(&'\'') => {
                            chars.next();
                            member.push('\'');
                        }
                        '\'' => break,
                        c => member.push(c),
                    }
                }
                members.push(member);
            }
            Some(_) => return None,
        }
    }
    Some(members)
}

// ================================================================
// Reader
// ================================================================

/// Reads live table definitions from a MySQL or MariaDB server.
pub struct SchemaReader {
    pool: MySqlPool,
    driver: MysqlDriver,
}

impl SchemaReader {
    /// Creates a reader over a connection pool.
    #[must_use]
    pub const fn new(pool: MySqlPool, driver: MysqlDriver) -> Self {
        Self { pool, driver }
    }

    /// Returns the driver used to resolve table names.
    #[must_use]
    pub const fn driver(&self) -> &MysqlDriver {
        &self.driver
    }

    /// Loads the columns of `table` (`table` or `database.table`).
    ///
    /// # Errors
    ///
    /// Returns [`IntrospectError::TableNotFound`] when the table has no
    /// visible columns, or a database error if a query fails.
    pub async fn load_columns(&self, table: &str) -> Result<Vec<LiveColumn>> {
        let path = self.driver.parse_table_name(table);
        let rows = self.column_rows(&path).await?;
        if rows.is_empty() {
            return Err(IntrospectError::TableNotFound(path.to_table_name()));
        }
        let unique = unique_columns(&self.index_rows(&path).await?);
        debug!(
            table = %path.to_table_name(),
            columns = rows.len(),
            unique = unique.len(),
            "loaded live columns"
        );

        let flavor = self.driver.options().flavor;
        rows.iter().map(|row| live_column(row, &unique, flavor)).collect()
    }

    async fn column_rows(&self, path: &TablePath) -> Result<Vec<ColumnRow>> {
        let rows: Vec<ColumnTuple> = sqlx::query_as(COLUMNS_SQL)
            .bind(path.database.as_deref())
            .bind(&path.table_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ColumnRow::from).collect())
    }

    async fn index_rows(&self, path: &TablePath) -> Result<Vec<IndexRow>> {
        let rows: Vec<(String, Option<String>, i64)> = sqlx::query_as(INDEXES_SQL)
            .bind(path.database.as_deref())
            .bind(&path.table_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(index_name, column_name, non_unique)| IndexRow {
                index_name,
                column_name,
                non_unique: non_unique != 0,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, data_type: &str, column_type: &str) -> ColumnRow {
        ColumnRow {
            column_name: name.to_string(),
            data_type: data_type.to_string(),
            column_type: column_type.to_string(),
            is_nullable: "YES".to_string(),
            ..ColumnRow::default()
        }
    }

    fn convert(row: &ColumnRow) -> LiveColumn {
        live_column(row, &BTreeSet::new(), Flavor::Mysql).unwrap()
    }

    #[test]
    fn enum_members_are_unquoted() {
        assert_eq!(
            enum_members("enum('a','b c','it''s')"),
            Some(vec!["a".to_string(), "b c".to_string(), "it's".to_string()])
        );
        assert_eq!(enum_members("set()"), Some(vec![]));
        assert_eq!(enum_members("enum"), None);
        assert_eq!(enum_members("enum('a'"), None);
    }

    #[test]
    fn default_widths_are_dropped() {
        assert_eq!(convert(&row("a", "int", "int(11)")).width, None);
        assert_eq!(convert(&row("a", "int", "int(10) unsigned")).width, None);
        assert_eq!(convert(&row("a", "int", "int(5)")).width, Some(5));
        assert_eq!(convert(&row("a", "int", "int")).width, None);
        assert_eq!(convert(&row("a", "bigint", "bigint(20) unsigned")).width, None);
    }

    #[test]
    fn zerofill_implies_unsigned() {
        let live = convert(&row("a", "int", "int(8) zerofill"));
        assert!(live.zerofill);
        assert!(live.unsigned);
        assert_eq!(live.width, Some(8));
    }

    #[test]
    fn lengths_follow_the_entity_side_defaults() {
        let varchar = ColumnRow {
            character_maximum_length: Some(255),
            ..row("a", "varchar", "varchar(255)")
        };
        assert_eq!(convert(&varchar).length, "255");
        let char_one = ColumnRow {
            character_maximum_length: Some(1),
            ..row("a", "char", "char(1)")
        };
        assert_eq!(convert(&char_one).length, "");
        let text = ColumnRow {
            character_maximum_length: Some(65535),
            ..row("a", "text", "text")
        };
        assert_eq!(convert(&text).length, "");
    }

    #[test]
    fn enum_columns_carry_members_and_no_length() {
        let status = ColumnRow {
            character_maximum_length: Some(9),
            column_default: Some("draft".to_string()),
            ..row("status", "enum", "enum('draft','published')")
        };
        let live = convert(&status);
        assert_eq!(live.column_type, "enum");
        assert_eq!(
            live.enum_values,
            Some(vec!["draft".to_string(), "published".to_string()])
        );
        assert_eq!(live.length, "");
        assert_eq!(live.default.as_deref(), Some("'draft'"));

        let broken = row("status", "enum", "enum");
        assert!(matches!(
            live_column(&broken, &BTreeSet::new(), Flavor::Mysql),
            Err(IntrospectError::MalformedColumnType { .. })
        ));
    }

    #[test]
    fn generated_columns() {
        let virtual_column = ColumnRow {
            extra: "VIRTUAL GENERATED".to_string(),
            generation_expression: Some("concat(`first`,' ',`last`)".to_string()),
            ..row("full_name", "varchar", "varchar(255)")
        };
        let live = convert(&virtual_column);
        assert_eq!(live.generated_type.as_deref(), Some("VIRTUAL"));
        assert!(live.as_expression.is_some());

        let id = ColumnRow {
            extra: "auto_increment".to_string(),
            column_key: "PRI".to_string(),
            is_nullable: "NO".to_string(),
            ..row("id", "int", "int")
        };
        let live = convert(&id);
        assert!(live.is_generated && live.is_primary && !live.is_nullable);
        assert_eq!(live.as_expression, None);
    }

    #[test]
    fn on_update_is_read_from_extra() {
        assert_eq!(
            on_update("DEFAULT_GENERATED on update CURRENT_TIMESTAMP(3)").as_deref(),
            Some("CURRENT_TIMESTAMP(3)")
        );
        assert_eq!(on_update("on update current_timestamp()").as_deref(), Some("CURRENT_TIMESTAMP()"));
        assert_eq!(on_update("auto_increment"), None);
    }

    #[test]
    fn defaults_per_flavor() {
        assert_eq!(live_default(None, Flavor::Mysql), None);
        assert_eq!(live_default(Some("NULL"), Flavor::Mariadb), None);
        assert_eq!(live_default(Some("abc"), Flavor::Mysql).as_deref(), Some("'abc'"));
        assert_eq!(live_default(Some("'abc'"), Flavor::Mariadb).as_deref(), Some("'abc'"));
        assert_eq!(
            live_default(Some("current_timestamp(6)"), Flavor::Mariadb).as_deref(),
            Some("CURRENT_TIMESTAMP(6)")
        );
    }

    #[test]
    fn unique_columns_ignore_primary_and_composites() {
        let index = |name: &str, column: &str, non_unique: bool| IndexRow {
            index_name: name.to_string(),
            column_name: Some(column.to_string()),
            non_unique,
        };
        let rows = vec![
            index("PRIMARY", "id", false),
            index("uq_email", "email", false),
            index("uq_pair", "a", false),
            index("uq_pair", "b", false),
            index("ix_name", "name", true),
        ];
        let unique = unique_columns(&rows);
        assert_eq!(unique.into_iter().collect::<Vec<_>>(), vec!["email".to_string()]);
    }
}
