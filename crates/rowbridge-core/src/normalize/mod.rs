//! Canonical forms for declared column definitions.
//!
//! The schema diff compares what the entity model declares against what
//! `INFORMATION_SCHEMA` reports. The two sides spell the same thing in
//! different ways (`dec` vs `decimal`, `now()` vs `CURRENT_TIMESTAMP`,
//! quoted vs bare literals), so the desired side is rewritten into the
//! form the server would report before comparing.

mod defaults;
mod types;

pub use defaults::{compare_default_values, escape_comment};
pub use types::{data_type_defaults, TypeDefaults};

use crate::options::Flavor;

/// Normalizes declared column types and defaults for one server flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    flavor: Flavor,
}

impl Normalizer {
    /// Creates a normalizer for the given server flavor.
    #[must_use]
    pub const fn new(flavor: Flavor) -> Self {
        Self { flavor }
    }

    /// Returns the server flavor.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.flavor
    }
}
