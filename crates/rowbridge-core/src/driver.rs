//! The driver facade.
//!
//! [`MysqlDriver`] bundles the per-instance options with the stateless
//! operations of this crate. It holds no connection; it only knows how
//! values, names and column definitions look on a MySQL-family server.

use std::collections::BTreeMap;

use crate::binder::{self, Parameter};
use crate::bits;
use crate::column::{ColumnModel, EntityModel, LiveColumn};
use crate::diff::SchemaDiff;
use crate::error::{Capability, DriverError, Result};
use crate::generated::{self, GeneratedMap, InsertResult};
use crate::marshal;
use crate::normalize::{self, Normalizer};
use crate::options::DriverOptions;
use crate::table_name::{self, TableNameResolver, TablePath, TableTarget};
use crate::value::Value;

/// Which server a statement should be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionRole {
    /// The primary (read/write) server.
    #[default]
    Primary,
    /// A read replica.
    Replica,
}

/// A MySQL or MariaDB driver instance.
#[derive(Debug, Clone, Default)]
pub struct MysqlDriver {
    options: DriverOptions,
    normalizer: Normalizer,
    resolver: TableNameResolver,
}

impl MysqlDriver {
    /// Creates a driver from its options.
    #[must_use]
    pub fn new(options: DriverOptions) -> Self {
        Self {
            normalizer: Normalizer::new(options.flavor),
            resolver: TableNameResolver::new(options.database.clone()),
            options,
        }
    }

    /// Returns the options the driver was created with.
    #[must_use]
    pub const fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Returns the type and default normalizer.
    #[must_use]
    pub const fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Returns the table name resolver.
    #[must_use]
    pub const fn resolver(&self) -> &TableNameResolver {
        &self.resolver
    }

    // ============================================================
    // Capabilities
    // ============================================================

    /// Fails for capabilities the MySQL driver family does not have.
    ///
    /// # Errors
    ///
    /// Always returns [`DriverError::Unsupported`] naming an alternative.
    pub fn require(&self, capability: Capability) -> Result<()> {
        let alternative = match capability {
            Capability::Replication => "ConnectionRole::Primary",
            Capability::Schemas => "database-qualified table names",
            Capability::Sequences => "auto-increment columns",
        };
        Err(DriverError::unsupported(capability, alternative))
    }

    /// Validates the connection role a caller asked for.
    ///
    /// # Errors
    ///
    /// Replicas are not supported.
    pub fn select_role(&self, role: ConnectionRole) -> Result<ConnectionRole> {
        match role {
            ConnectionRole::Primary => Ok(role),
            ConnectionRole::Replica => self.require(Capability::Replication).map(|()| role),
        }
    }

    // ============================================================
    // Values
    // ============================================================

    /// Decodes a `BIT(n)` wire value.
    #[must_use]
    pub fn decode_bit_field(&self, raw: &Value) -> u64 {
        bits::decode(raw)
    }

    /// Converts an application value into its wire form.
    #[must_use]
    pub fn persist(&self, value: Value, column: &ColumnModel) -> Value {
        marshal::persist(value, column)
    }

    /// Converts a wire value into its application form.
    #[must_use]
    pub fn hydrate(&self, value: Value, column: &ColumnModel) -> Value {
        marshal::hydrate(value, column)
    }

    /// Rewrites named placeholders into positional ones.
    #[must_use]
    pub fn bind(
        &self,
        sql: &str,
        parameters: &BTreeMap<String, Parameter>,
        native: &BTreeMap<String, Value>,
    ) -> (String, Vec<Value>) {
        binder::bind(sql, parameters, native)
    }

    /// Builds the generated-value map for the entity at `index` of a batch
    /// insert.
    #[must_use]
    pub fn create_generated_map(
        &self,
        entity: &EntityModel,
        result: Option<&InsertResult>,
        index: usize,
    ) -> Option<GeneratedMap> {
        generated::create_generated_map(entity, result, index)
    }

    // ============================================================
    // Names
    // ============================================================

    /// Resolves a target into database and table name.
    #[must_use]
    pub fn parse_table_name<'a>(&self, target: impl Into<TableTarget<'a>>) -> TablePath {
        self.resolver.parse_table_name(target)
    }

    /// Joins a table name with its database.
    #[must_use]
    pub fn build_table_name(
        &self,
        table_name: &str,
        schema: Option<&str>,
        database: Option<&str>,
    ) -> String {
        table_name::build_table_name(table_name, schema, database)
    }

    /// Quotes an identifier.
    #[must_use]
    pub fn escape_identifier(&self, name: &str) -> String {
        table_name::escape_identifier(name)
    }

    // ============================================================
    // Schema
    // ============================================================

    /// Returns the normalized type name of a column.
    #[must_use]
    pub fn normalize_type(&self, column: &ColumnModel) -> String {
        self.normalizer.normalize_type(column)
    }

    /// Returns the normalized length of a column.
    #[must_use]
    pub fn column_length(&self, column: &ColumnModel) -> String {
        self.normalizer.column_length(column)
    }

    /// Builds the full type clause of a column.
    #[must_use]
    pub fn full_type(&self, column: &ColumnModel) -> String {
        self.normalizer.full_type(column)
    }

    /// Renders a column's default the way the server reports it.
    #[must_use]
    pub fn normalize_default(&self, column: &ColumnModel) -> Option<String> {
        self.normalizer.normalize_default(column)
    }

    /// Canonicalizes current-timestamp spellings.
    #[must_use]
    pub fn normalize_datetime_function(&self, value: Option<&str>) -> Option<String> {
        self.normalizer.normalize_datetime_function(value)
    }

    /// Compares a normalized desired default with a live one.
    #[must_use]
    pub fn compare_default_values(&self, desired: Option<&str>, live: Option<&str>) -> bool {
        normalize::compare_default_values(desired, live)
    }

    /// Returns the entity columns whose live definition drifted.
    #[must_use]
    pub fn find_changed_columns<'e>(
        &self,
        live: &[LiveColumn],
        entity: &'e EntityModel,
    ) -> Vec<&'e ColumnModel> {
        SchemaDiff::new(self.normalizer).changed_columns(live, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{GenerationStrategy, NativeType};
    use crate::options::Flavor;

    fn driver() -> MysqlDriver {
        MysqlDriver::new(DriverOptions::new().database("app").flavor(Flavor::Mariadb))
    }

    #[test]
    fn replica_role_is_rejected() {
        let driver = driver();
        assert_eq!(driver.select_role(ConnectionRole::Primary).unwrap(), ConnectionRole::Primary);
        let err = driver.select_role(ConnectionRole::Replica).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Unsupported {
                capability: Capability::Replication,
                alternative: "ConnectionRole::Primary"
            }
        ));
    }

    #[test]
    fn every_capability_check_fails() {
        let driver = driver();
        for capability in [Capability::Replication, Capability::Schemas, Capability::Sequences] {
            assert!(driver.require(capability).is_err());
        }
    }

    #[test]
    fn options_flow_into_components() {
        let driver = driver();
        assert_eq!(driver.parse_table_name("users").to_table_name(), "app.users");
        assert_eq!(
            driver.normalize_type(&ColumnModel::new("doc", "json")),
            "longtext"
        );
        assert_eq!(
            driver.normalize_datetime_function(Some("now()")).as_deref(),
            Some("CURRENT_TIMESTAMP()")
        );
    }

    #[test]
    fn facade_delegates() {
        let driver = MysqlDriver::default();
        let column = ColumnModel::new("id", NativeType::Number)
            .primary()
            .generated(GenerationStrategy::Increment);
        let entity = EntityModel::new("t").column(column.clone());
        assert_eq!(driver.decode_bit_field(&Value::Bytes(vec![1, 0])), 256);
        assert_eq!(driver.persist(Value::from("5"), &column), Value::Int(5));
        assert_eq!(driver.full_type(&ColumnModel::new("d", "decimal").precision(10).scale(2)), "decimal(10,2)");
        assert_eq!(driver.build_table_name("t", None, Some("db")), "db.t");
        let map = driver
            .create_generated_map(
                &entity,
                Some(&InsertResult::Ok {
                    insert_id: Value::UInt(7),
                    affected_rows: 1,
                }),
                0,
            )
            .unwrap();
        assert_eq!(map.get_path(&["id"]), Some(&Value::UInt(7)));
    }
}
