//! # rowbridge-core
//!
//! Value marshalling and schema reconciliation for MySQL-family drivers.
//!
//! This crate sits between an ORM's entity metadata and a MySQL or MariaDB
//! client. It provides:
//! - Conversion of application values to wire values and back
//!   ([`marshal`]), including `BIT(n)` decoding ([`bits`])
//! - Rewriting of `:name` / `:...name` placeholders into positional `?`
//!   markers ([`binder`])
//! - Mapping of insert results onto generated columns ([`generated`])
//! - Resolution of `database.table` names ([`table_name`])
//! - Canonical type and default forms ([`normalize`]) and drift detection
//!   between entity columns and live columns ([`diff`])
//!
//! Everything here is synchronous and free of I/O. Malformed wire values
//! degrade to a fallback with a `tracing` diagnostic instead of failing;
//! errors are reserved for capabilities the driver family lacks.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use rowbridge_core::prelude::*;
//!
//! let driver = MysqlDriver::new(DriverOptions::new().database("app"));
//!
//! let active = ColumnModel::new("active", NativeType::Boolean);
//! assert_eq!(driver.persist(Value::Bool(true), &active), Value::Int(1));
//! assert_eq!(driver.hydrate(Value::Int(0), &active), Value::Bool(false));
//!
//! let mut params = BTreeMap::new();
//! params.insert("ids".to_string(), Parameter::list([1, 2]));
//! let (sql, values) = driver.bind(
//!     "SELECT * FROM users WHERE id IN (:...ids)",
//!     &params,
//!     &BTreeMap::new(),
//! );
//! assert_eq!(sql, "SELECT * FROM users WHERE id IN (?, ?)");
//! assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
//!
//! assert_eq!(driver.parse_table_name("users").to_table_name(), "app.users");
//! ```

pub mod binder;
pub mod bits;
pub mod column;
pub mod diff;
pub mod driver;
pub mod error;
pub mod generated;
pub mod marshal;
pub mod normalize;
pub mod options;
pub mod table_name;
pub mod temporal;
pub mod value;

pub use binder::{bind, Parameter};
pub use column::{
    ColumnModel, ColumnType, DefaultValue, EntityModel, EnumMember, FnTransformer,
    GenerationStrategy, IndexModel, LiveColumn, NativeType, ValueTransformer,
};
pub use diff::{ColumnAttribute, NullabilityFn, NullableComparator, SchemaDiff, StrictNullability};
pub use driver::{ConnectionRole, MysqlDriver};
pub use error::{Capability, DriverError, Result};
pub use generated::{create_generated_map, GeneratedMap, InsertResult, MapNode};
pub use normalize::Normalizer;
pub use options::{DriverOptions, Flavor};
pub use table_name::{
    build_table_name, escape_identifier, ForeignKeyDescriptor, TableDescriptor,
    TableNameResolver, TablePath, TableTarget, ViewDescriptor,
};
pub use value::{Computed, Value};

/// Commonly used items.
pub mod prelude {
    pub use crate::binder::Parameter;
    pub use crate::column::{
        ColumnModel, ColumnType, DefaultValue, EntityModel, GenerationStrategy, IndexModel,
        LiveColumn, NativeType,
    };
    pub use crate::driver::{ConnectionRole, MysqlDriver};
    pub use crate::error::{DriverError, Result};
    pub use crate::generated::{GeneratedMap, InsertResult};
    pub use crate::options::{DriverOptions, Flavor};
    pub use crate::value::{Computed, Value};
}
