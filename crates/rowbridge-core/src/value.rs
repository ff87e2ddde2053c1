//! Application and wire values.
//!
//! A single [`Value`] enum is used on both sides of the marshaller: the
//! application hands one to [`persist`](crate::marshal::persist) and gets
//! one back from [`hydrate`](crate::marshal::hydrate). Which variants are
//! meaningful depends on the column type.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value flowing between the application and the database client.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL / absent.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer (ids, bit fields).
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Wall-clock time.
    Time(NaiveTime),
    /// Instant in UTC.
    DateTime(DateTime<Utc>),
    /// Structured JSON document.
    Json(serde_json::Value),
    /// Ordered list of values.
    Array(Vec<Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value the way it appears when coerced to a string.
    ///
    /// Arrays are joined with `,`, NULL renders as the empty string and
    /// JSON strings render without quotes.
    #[must_use]
    pub fn stringify(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::UInt(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Json(serde_json::Value::String(s)) => s.clone(),
            Self::Json(j) => j.to_string(),
            Self::Array(items) => items
                .iter()
                .map(Self::stringify)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Interprets the value as a number, if it is numeric-like.
    ///
    /// Numbers are returned as-is, text is parsed after trimming, and
    /// booleans count as 0/1. Returns `None` for anything else.
    #[must_use]
    pub fn to_number(&self) -> Option<Self> {
        match self {
            Self::Int(_) | Self::UInt(_) => Some(self.clone()),
            Self::Float(f) if f.is_finite() => Some(self.clone()),
            Self::Bool(b) => Some(Self::Int(i64::from(*b))),
            Self::Text(s) => parse_number(s),
            Self::Json(serde_json::Value::Number(n)) => Some(number_from_json(n)),
            _ => None,
        }
    }

    /// Converts the value into a JSON document.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::UInt(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Bytes(b) => serde_json::Value::Array(
                b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
            ),
            Self::Text(_) | Self::Date(_) | Self::Time(_) | Self::DateTime(_) => {
                serde_json::Value::String(self.stringify())
            }
            Self::Json(j) => j.clone(),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

/// Parses numeric-like text into an integer or float value.
#[must_use]
pub fn parse_number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::Int(n));
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(Value::UInt(n));
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(Value::Float(f)),
        _ => None,
    }
}

fn number_from_json(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(u) = n.as_u64() {
        Value::UInt(u)
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => number_from_json(&n),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            object @ serde_json::Value::Object(_) => Self::Json(object),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )+
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    DateTime<Utc> => DateTime,
);

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A zero-argument producer of SQL text, invoked at the point of use.
///
/// Used for defaults such as `() => "CURRENT_TIMESTAMP"` and for query
/// parameters that splice raw SQL into the statement.
#[derive(Clone)]
pub struct Computed(Arc<dyn Fn() -> String + Send + Sync>);

impl Computed {
    /// Wraps a producer.
    pub fn new(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Wraps a fixed SQL fragment.
    #[must_use]
    pub fn sql(fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self::new(move || fragment.clone())
    }

    /// Invokes the producer.
    #[must_use]
    pub fn call(&self) -> String {
        (self.0)()
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed").finish_non_exhaustive()
    }
}

impl PartialEq for Computed {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringify_matches_string_coercion() {
        assert_eq!(Value::Int(-3).stringify(), "-3");
        assert_eq!(Value::Float(2.5).stringify(), "2.5");
        assert_eq!(Value::Float(3.0).stringify(), "3");
        assert_eq!(Value::Bool(true).stringify(), "true");
        assert_eq!(
            Value::Array(vec![Value::from("a"), Value::Int(1)]).stringify(),
            "a,1"
        );
        assert_eq!(Value::Json(serde_json::json!("plain")).stringify(), "plain");
    }

    #[test]
    fn parse_number_accepts_numeric_text_only() {
        assert_eq!(parse_number(" 42 "), Some(Value::Int(42)));
        assert_eq!(parse_number("18446744073709551615"), Some(Value::UInt(u64::MAX)));
        assert_eq!(parse_number("1.25"), Some(Value::Float(1.25)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let json = serde_json::json!({"a": [1, "b", null]});
        let value = Value::from(json.clone());
        assert_eq!(value, Value::Json(json.clone()));
        assert_eq!(value.to_json(), json);

        let list = Value::from(serde_json::json!([1, 2]));
        assert_eq!(list, Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn value_serde_uses_json_shape() {
        let value: Value = serde_json::from_str(r#"[5, "x", true]"#).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::Int(5), Value::from("x"), Value::Bool(true)])
        );
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[5,"x",true]"#);
    }

    #[test]
    fn computed_is_invoked_on_call() {
        let computed = Computed::sql("NOW()");
        assert_eq!(computed.call(), "NOW()");
        assert_eq!(computed, computed.clone());
        assert_ne!(computed, Computed::sql("NOW()"));
    }

    #[test]
    fn computed_debug_does_not_invoke_producer() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let computed = Computed::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            "NOW()".to_string()
        });
        assert_eq!(format!("{computed:?}"), "Computed { .. }");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
