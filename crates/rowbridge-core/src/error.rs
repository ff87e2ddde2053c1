//! Error types for the driver core.
//!
//! Almost everything in this crate degrades instead of failing: a
//! malformed bit field decodes to zero, an unknown placeholder stays in
//! the SQL text. Errors are reserved for capabilities the MySQL driver
//! family does not have at all.

use std::fmt;

/// A driver capability that callers may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Routing statements to a read replica.
    Replication,
    /// A schema segment distinct from the database name.
    Schemas,
    /// Native sequence objects.
    Sequences,
}

impl Capability {
    /// Returns a human readable name of the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replication => "replica connections",
            Self::Schemas => "schema-qualified table names",
            Self::Sequences => "sequences",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the driver core.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The caller asked for something this driver family cannot do.
    #[error("{capability} are not supported by the MySQL driver; use {alternative} instead")]
    Unsupported {
        /// The missing capability.
        capability: Capability,
        /// The entry point to use instead.
        alternative: &'static str,
    },
}

impl DriverError {
    /// Creates an [`DriverError::Unsupported`] error.
    #[must_use]
    pub const fn unsupported(capability: Capability, alternative: &'static str) -> Self {
        Self::Unsupported {
            capability,
            alternative,
        }
    }
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_capability_and_alternative() {
        let err = DriverError::unsupported(Capability::Replication, "ConnectionRole::Primary");
        assert_eq!(
            err.to_string(),
            "replica connections are not supported by the MySQL driver; \
             use ConnectionRole::Primary instead"
        );
    }
}
