//! Live schema introspection for rowbridge.
//!
//! `rowbridge-mysql` reads table definitions from a running MySQL or
//! MariaDB server and turns them into [`rowbridge_core::LiveColumn`]s that
//! can be compared against entity models with
//! [`rowbridge_core::MysqlDriver::find_changed_columns`].
//!
//! # Example
//!
//! ```rust,ignore
//! use rowbridge_core::{DriverOptions, MysqlDriver};
//! use rowbridge_mysql::SchemaReader;
//! use sqlx::mysql::MySqlPoolOptions;
//!
//! let pool = MySqlPoolOptions::new()
//!     .connect("mysql://root@localhost/app")
//!     .await?;
//! let reader = SchemaReader::new(pool, MysqlDriver::new(DriverOptions::new()));
//! let live = reader.load_columns("users").await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Columns of a table whose definition drifted from the entity file
//! rowbridge --database-url mysql://root@localhost/app diff --entity users.json
//!
//! # Same, against a saved snapshot instead of a live server
//! rowbridge diff --entity users.json --live users.live.json
//!
//! # Dump live columns as JSON
//! rowbridge --database-url mysql://root@localhost/app introspect users
//!
//! # Rewrite named parameters
//! rowbridge bind "SELECT * FROM t WHERE id IN (:...ids)" --params '{"ids": [1, 2]}'
//! ```

pub mod error;
pub mod input;
pub mod introspect;

pub use error::{IntrospectError, Result};
pub use introspect::{live_column, unique_columns, ColumnRow, IndexRow, SchemaReader};
