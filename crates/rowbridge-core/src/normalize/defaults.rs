//! Default value, `ON UPDATE` and comment normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::column::{ColumnModel, ColumnType, DefaultValue};
use crate::options::Flavor;

use super::Normalizer;

static DATETIME_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:CURRENT_TIMESTAMP|NOW|LOCALTIMESTAMP|LOCALTIME)\b")
        .expect("datetime function pattern is valid")
});

static PRECISION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d+\)").expect("precision pattern is valid"));

const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

impl Normalizer {
    /// Renders a column's declared default the way the server reports it.
    ///
    /// Returns `None` when no default clause applies.
    #[must_use]
    pub fn normalize_default(&self, column: &ColumnModel) -> Option<String> {
        let default = column.default.as_ref()?;
        match default {
            DefaultValue::Null => None,
            other if column.column_type.is_enum() => Some(format!("'{}'", literal_text(other))),
            DefaultValue::Text(text) => Some(format!("'{text}'")),
            DefaultValue::List(items) if column.column_type == ColumnType::Set => {
                Some(format!("'{}'", items.join(",")))
            }
            DefaultValue::Integer(n) => Some(match column.scale {
                Some(scale) if scale > 0 => format!("{n}.{}", "0".repeat(scale as usize)),
                _ => n.to_string(),
            }),
            DefaultValue::Float(f) => Some(format!("{:.*}", column.scale.unwrap_or(0) as usize, f)),
            DefaultValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            DefaultValue::Computed(computed) => {
                self.normalize_datetime_function(Some(&computed.call()))
            }
            DefaultValue::List(items) => Some(items.join(",")),
        }
    }

    /// Rewrites any current-timestamp spelling (`now()`,
    /// `current_timestamp(3)`, ...) into the canonical
    /// `CURRENT_TIMESTAMP[(p)]`. Other values are returned unchanged.
    #[must_use]
    pub fn normalize_datetime_function(&self, value: Option<&str>) -> Option<String> {
        let value = value?;
        if !DATETIME_FUNCTION.is_match(value) {
            return Some(value.to_string());
        }
        let normalized = match (PRECISION_SUFFIX.find(value), self.flavor) {
            (Some(precision), _) => format!("{CURRENT_TIMESTAMP}{}", precision.as_str()),
            (None, Flavor::Mariadb) => format!("{CURRENT_TIMESTAMP}()"),
            (None, Flavor::Mysql) => CURRENT_TIMESTAMP.to_string(),
        };
        Some(normalized)
    }
}

fn literal_text(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Null => String::new(),
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Integer(n) => n.to_string(),
        DefaultValue::Float(f) => f.to_string(),
        DefaultValue::Text(text) => text.clone(),
        DefaultValue::List(items) => items.join(","),
        DefaultValue::Computed(computed) => computed.call(),
    }
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('\'').unwrap_or(value);
    value.strip_suffix('\'').unwrap_or(value)
}

/// Compares a normalized desired default with a live default.
///
/// When both are present, one layer of single quotes is stripped from
/// each side first: the server does not tell string literals and
/// function calls apart consistently.
#[must_use]
pub fn compare_default_values(desired: Option<&str>, live: Option<&str>) -> bool {
    match (desired, live) {
        (Some(desired), Some(live)) => strip_quotes(desired) == strip_quotes(live),
        (desired, live) => desired == live,
    }
}

/// Prepares a comment for storage: null bytes are dropped and an empty
/// comment counts as no comment.
#[must_use]
pub fn escape_comment(comment: Option<&str>) -> Option<String> {
    match comment {
        Some(comment) if !comment.is_empty() => Some(comment.replace('\0', "")),
        _ => None,
    }
}
