//! Named-to-positional parameter rewriting.
//!
//! Statements are written with `:name` placeholders and `:...name` for
//! list expansion. The MySQL protocol only knows positional `?`, so the
//! template is rewritten and the values are collected in the order their
//! markers appear.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::value::{Computed, Value};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(\.\.\.)?([A-Za-z0-9_.]+)").expect("placeholder pattern is valid")
});

/// The positional marker.
pub const PLACEHOLDER_MARKER: &str = "?";

/// A named query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// A value bound positionally.
    Value(Value),
    /// SQL text spliced into the statement in place of the placeholder.
    Computed(Computed),
}

impl Parameter {
    /// Creates a bound value parameter.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Creates a list parameter for `:...name` expansion.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Value(Value::Array(values.into_iter().map(Into::into).collect()))
    }

    /// Creates a raw SQL parameter.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Computed(Computed::sql(sql))
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Computed> for Parameter {
    fn from(computed: Computed) -> Self {
        Self::Computed(computed)
    }
}

/// Rewrites named placeholders into positional ones.
///
/// `native` values come first, in key order, whether or not the SQL
/// refers to them. Numeric keys (positional indexes) are ordered by value,
/// so `"10"` follows `"9"`. Placeholders whose name is not in `parameters` are left
/// in the text untouched (time literals such as `'10:30'` look like
/// placeholders).
#[must_use]
pub fn bind(
    sql: &str,
    parameters: &BTreeMap<String, Parameter>,
    native: &BTreeMap<String, Value>,
) -> (String, Vec<Value>) {
    let mut natives: Vec<(&String, &Value)> = native.iter().collect();
    natives.sort_by(|(a, _), (b, _)| native_key_order(a, b));
    let mut values: Vec<Value> = natives.into_iter().map(|(_, value)| value.clone()).collect();
    if parameters.is_empty() {
        return (sql.to_string(), values);
    }

    let rewritten = PLACEHOLDER.replace_all(sql, |caps: &Captures<'_>| {
        let full = &caps[0];
        let name = &caps[2];
        let Some(parameter) = parameters.get(name) else {
            debug!(placeholder = %full, "no parameter bound, keeping literal text");
            return full.to_string();
        };
        match (caps.get(1).is_some(), parameter) {
            (true, Parameter::Value(Value::Array(items))) => {
                values.extend(items.iter().cloned());
                vec![PLACEHOLDER_MARKER; items.len()].join(", ")
            }
            (true, Parameter::Value(value)) => {
                warn!(parameter = %name, "list expansion of a non-list value, binding it once");
                values.push(value.clone());
                PLACEHOLDER_MARKER.to_string()
            }
            (_, Parameter::Computed(computed)) => computed.call(),
            (false, Parameter::Value(value)) => {
                values.push(value.clone());
                PLACEHOLDER_MARKER.to_string()
            }
        }
    });

    (rewritten.into_owned(), values)
}

/// Numeric keys first, by value; other keys after them, as text.
fn native_key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
