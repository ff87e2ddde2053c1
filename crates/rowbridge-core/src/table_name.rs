//! Resolution of partially qualified table names.
//!
//! MySQL has no schema level between database and table, so paths are
//! `database.table` at most. The default database is carried by the
//! resolver instead of being read from global driver state.

use serde::{Deserialize, Serialize};

use crate::column::EntityModel;

/// A live or planned table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name, possibly `database.table`.
    pub name: String,
    /// Explicit database.
    pub database: Option<String>,
    /// Explicit schema.
    pub schema: Option<String>,
}

/// A live or planned view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    /// View name, possibly `database.view`.
    pub name: String,
    /// Explicit database.
    pub database: Option<String>,
    /// Explicit schema.
    pub schema: Option<String>,
}

/// A foreign key; resolves to the table it references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Constraint name.
    pub name: Option<String>,
    /// Referenced table, possibly `database.table`.
    pub referenced_table_name: String,
    /// Explicit database of the referenced table.
    pub referenced_database: Option<String>,
    /// Explicit schema of the referenced table.
    pub referenced_schema: Option<String>,
}

/// Anything a table path can be resolved from.
#[derive(Debug, Clone, Copy)]
pub enum TableTarget<'a> {
    /// A table descriptor.
    Table(&'a TableDescriptor),
    /// A view descriptor.
    View(&'a ViewDescriptor),
    /// A foreign key (resolved via its referenced table).
    ForeignKey(&'a ForeignKeyDescriptor),
    /// An entity model.
    Entity(&'a EntityModel),
    /// A plain name, `table` or `database.table`.
    Name(&'a str),
}

impl<'a> From<&'a str> for TableTarget<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a TableDescriptor> for TableTarget<'a> {
    fn from(table: &'a TableDescriptor) -> Self {
        Self::Table(table)
    }
}

impl<'a> From<&'a ViewDescriptor> for TableTarget<'a> {
    fn from(view: &'a ViewDescriptor) -> Self {
        Self::View(view)
    }
}

impl<'a> From<&'a ForeignKeyDescriptor> for TableTarget<'a> {
    fn from(fk: &'a ForeignKeyDescriptor) -> Self {
        Self::ForeignKey(fk)
    }
}

impl<'a> From<&'a EntityModel> for TableTarget<'a> {
    fn from(entity: &'a EntityModel) -> Self {
        Self::Entity(entity)
    }
}

/// A resolved table path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePath {
    /// Database, explicit or defaulted.
    pub database: Option<String>,
    /// Schema; only ever set explicitly.
    pub schema: Option<String>,
    /// Bare table name.
    pub table_name: String,
}

impl TablePath {
    /// Renders the path as `database.table` (or `table`).
    #[must_use]
    pub fn to_table_name(&self) -> String {
        build_table_name(&self.table_name, self.schema.as_deref(), self.database.as_deref())
    }
}

/// Resolves table targets against a default database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableNameResolver {
    default_database: Option<String>,
}

impl TableNameResolver {
    /// Creates a resolver with the given default database.
    #[must_use]
    pub fn new(default_database: Option<String>) -> Self {
        Self { default_database }
    }

    /// Returns the default database.
    #[must_use]
    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }

    /// Resolves a target into database, schema and bare table name.
    ///
    /// Explicit values on the target win over a `database.` prefix in its
    /// name, which wins over the default database.
    #[must_use]
    pub fn parse_table_name<'a>(&self, target: impl Into<TableTarget<'a>>) -> TablePath {
        match target.into() {
            TableTarget::Table(table) => {
                self.resolve_named(&table.name, table.database.as_ref(), table.schema.as_ref())
            }
            TableTarget::View(view) => {
                self.resolve_named(&view.name, view.database.as_ref(), view.schema.as_ref())
            }
            TableTarget::ForeignKey(fk) => self.resolve_named(
                &fk.referenced_table_name,
                fk.referenced_database.as_ref(),
                fk.referenced_schema.as_ref(),
            ),
            TableTarget::Entity(entity) => TablePath {
                database: entity.database.clone().or_else(|| self.default_database.clone()),
                schema: entity.schema.clone(),
                table_name: entity.table_name.clone(),
            },
            TableTarget::Name(name) => {
                let (database, table_name) = split_name(name);
                TablePath {
                    database: database
                        .map(str::to_string)
                        .or_else(|| self.default_database.clone()),
                    schema: None,
                    table_name: table_name.to_string(),
                }
            }
        }
    }

    fn resolve_named(
        &self,
        name: &str,
        database: Option<&String>,
        schema: Option<&String>,
    ) -> TablePath {
        let parsed = self.parse_table_name(name);
        TablePath {
            database: database.cloned().or(parsed.database),
            schema: schema.cloned().or(parsed.schema),
            table_name: parsed.table_name,
        }
    }
}

/// Splits `database.table` into its parts; anything after a second dot
/// is dropped.
fn split_name(name: &str) -> (Option<&str>, &str) {
    let mut parts = name.split('.');
    let first = parts.next().unwrap_or_default();
    match parts.next() {
        Some(table) => (Some(first).filter(|db| !db.is_empty()), table),
        None => (None, first),
    }
}

/// Joins a table name with its database.
///
/// `schema` is accepted for symmetry with other dialects and ignored.
#[must_use]
pub fn build_table_name(table_name: &str, _schema: Option<&str>, database: Option<&str>) -> String {
    match database {
        Some(database) => format!("{database}.{table_name}"),
        None => table_name.to_string(),
    }
}

/// Quotes an identifier with backticks.
#[must_use]
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
