//! Driver configuration.

use serde::{Deserialize, Serialize};

/// The server family the driver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Oracle MySQL.
    #[default]
    Mysql,
    /// MariaDB.
    Mariadb,
}

impl Flavor {
    /// Returns the flavor name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
        }
    }
}

impl std::str::FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "mariadb" => Ok(Self::Mariadb),
            other => Err(format!("unknown server flavor: {other}")),
        }
    }
}

/// Options shared by every operation of a driver instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Database used when a table name does not carry one.
    pub database: Option<String>,
    /// Server family.
    pub flavor: Flavor,
}

impl DriverOptions {
    /// Creates options for a MySQL server without a default database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default database.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the server flavor.
    #[must_use]
    pub const fn flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: DriverOptions = serde_json::from_str(r#"{"flavor":"mariadb"}"#).unwrap();
        assert_eq!(opts.flavor, Flavor::Mariadb);
        assert_eq!(opts.database, None);

        let opts: DriverOptions = serde_json::from_str(r#"{"database":"shop"}"#).unwrap();
        assert_eq!(opts.flavor, Flavor::Mysql);
        assert_eq!(opts.database.as_deref(), Some("shop"));
    }

    #[test]
    fn flavor_from_str_is_case_insensitive() {
        assert_eq!("MariaDB".parse::<Flavor>(), Ok(Flavor::Mariadb));
        assert!("postgres".parse::<Flavor>().is_err());
    }
}
