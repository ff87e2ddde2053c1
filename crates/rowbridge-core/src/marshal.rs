//! Value marshalling between the application and the wire.
//!
//! Every field of every row passes through [`persist`] on write and
//! [`hydrate`] on read. The two are inverse for values the column can
//! represent: `hydrate(persist(x, col), col) == x`.
//!
//! Application-side representations per column type:
//!
//! | column type                             | application value          |
//! |-----------------------------------------|----------------------------|
//! | `Boolean`, `bool`, `boolean`            | [`Value::Bool`]            |
//! | `Date`, `datetime`, `timestamp`         | [`Value::DateTime`]        |
//! | `date`                                  | `YYYY-MM-DD` text          |
//! | `time`                                  | `HH:MM:SS[.fff]` text      |
//! | `json`, `simple-json`                   | [`Value::Json`]            |
//! | `simple-array`, `set`                   | [`Value::Array`] of text   |
//! | `enum`, `simple-enum`                   | text, or integer members   |
//! | `Number`                                | integer                    |
//! | `bit`                                   | [`Value::UInt`]            |

use tracing::warn;

use crate::bits;
use crate::column::{ColumnModel, ColumnType, EnumMember, NativeType};
use crate::temporal;
use crate::value::{parse_number, Value};

/// Converts an application value into its wire form.
///
/// Transformers run first, NULL included; a NULL coming out of them is
/// returned as-is.
#[must_use]
pub fn persist(value: Value, column: &ColumnModel) -> Value {
    let value = column
        .transformers
        .iter()
        .fold(value, |value, transformer| transformer.to_database(value));
    if value.is_null() {
        return value;
    }

    match &column.column_type {
        ColumnType::Native(NativeType::Boolean) | ColumnType::Bool | ColumnType::Boolean => {
            Value::Int(i64::from(truthy(&value)))
        }
        ColumnType::Date => temporal::to_date_string(value),
        ColumnType::Time => temporal::to_time_string(value),
        ColumnType::Json | ColumnType::SimpleJson => Value::Text(value.to_json().to_string()),
        ColumnType::Timestamp | ColumnType::DateTime | ColumnType::Native(NativeType::Date) => {
            temporal::to_utc_datetime(value)
        }
        ColumnType::SimpleArray | ColumnType::Set | ColumnType::Enum | ColumnType::SimpleEnum => {
            Value::Text(value.stringify())
        }
        ColumnType::Native(NativeType::Number) => persist_integer(value),
        _ => value,
    }
}

/// Converts a wire value into its application form.
///
/// Transformers run last, in reverse order, on the hydrated value. A NULL
/// wire value skips type conversion but still goes through them.
#[must_use]
pub fn hydrate(value: Value, column: &ColumnModel) -> Value {
    if value.is_null() {
        return apply_from_database(value, column);
    }

    let hydrated = match &column.column_type {
        ColumnType::Native(NativeType::Boolean) | ColumnType::Bool | ColumnType::Boolean => {
            Value::Bool(truthy(&value))
        }
        ColumnType::DateTime | ColumnType::Timestamp | ColumnType::Native(NativeType::Date) => {
            temporal::hydrate_datetime(value)
        }
        ColumnType::Date => temporal::to_date_string(value),
        ColumnType::Time => temporal::to_time_string(value),
        ColumnType::Json | ColumnType::SimpleJson => parse_json(value),
        ColumnType::SimpleArray | ColumnType::Set => split_list(value),
        ColumnType::Enum | ColumnType::SimpleEnum => hydrate_enum(value, column),
        ColumnType::Native(NativeType::Number) => match value.to_number() {
            Some(number) => number,
            None => value,
        },
        ColumnType::Bit => match value {
            Value::Int(_) | Value::UInt(_) => value,
            raw => Value::UInt(bits::decode(&raw)),
        },
        _ => value,
    };

    apply_from_database(hydrated, column)
}

fn apply_from_database(value: Value, column: &ColumnModel) -> Value {
    column
        .transformers
        .iter()
        .rev()
        .fold(value, |value, transformer| transformer.from_database(value))
}

/// Boolean interpretation of a wire or application value.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::UInt(n) => *n != 0,
        Value::Float(f) => *f != 0.0 && !f.is_nan(),
        Value::Bytes(bytes) => bytes.iter().any(|b| *b != 0),
        Value::Text(text) => match parse_number(text) {
            Some(number) => truthy(&number),
            None => !(text.is_empty() || text.eq_ignore_ascii_case("false")),
        },
        _ => true,
    }
}

/// Truncates numeric-like values to integers; everything else passes.
fn persist_integer(value: Value) -> Value {
    match value.to_number() {
        Some(Value::Float(f)) => {
            let truncated = f.trunc();
            if truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
                Value::Int(truncated as i64)
            } else {
                Value::Float(f)
            }
        }
        Some(number) => number,
        None => value,
    }
}

fn parse_json(value: Value) -> Value {
    let parsed = match &value {
        Value::Text(text) => serde_json::from_str(text),
        Value::Bytes(bytes) => serde_json::from_slice(bytes),
        _ => return value,
    };
    match parsed {
        Ok(json) => Value::Json(json),
        Err(err) => {
            warn!(error = %err, "unparseable JSON wire value, passing through");
            value
        }
    }
}

fn split_list(value: Value) -> Value {
    match value {
        Value::Text(text) if text.is_empty() => Value::Array(Vec::new()),
        Value::Text(text) => Value::Array(text.split(',').map(Value::from).collect()),
        other => other,
    }
}

fn hydrate_enum(value: Value, column: &ColumnModel) -> Value {
    let Some(members) = &column.enum_values else {
        return value;
    };
    let candidate = match &value {
        Value::Int(n) => Some(*n),
        Value::UInt(n) => i64::try_from(*n).ok(),
        Value::Text(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match candidate {
        Some(n) if members.contains(&EnumMember::Int(n)) => Value::Int(n),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::column::FnTransformer;

    #[test]
    fn booleans_persist_as_bits() {
        let column = ColumnModel::new("active", NativeType::Boolean);
        assert_eq!(persist(Value::Bool(true), &column), Value::Int(1));
        assert_eq!(persist(Value::Bool(false), &column), Value::Int(0));
        assert_eq!(hydrate(Value::Int(1), &column), Value::Bool(true));
        assert_eq!(hydrate(Value::Int(0), &column), Value::Bool(false));
        assert_eq!(hydrate(Value::from("0"), &column), Value::Bool(false));
        assert_eq!(hydrate(Value::Bytes(vec![1]), &column), Value::Bool(true));
    }

    #[test]
    fn null_passes_through_untouched() {
        let column = ColumnModel::new("a", "json");
        assert_eq!(persist(Value::Null, &column), Value::Null);
        assert_eq!(hydrate(Value::Null, &column), Value::Null);
    }

    #[test]
    fn transformers_see_null_in_both_directions() {
        let column = ColumnModel::new("a", "varchar").transformer(FnTransformer::new(
            "null-to-empty",
            |v| if v.is_null() { Value::from("") } else { v },
            |v| if v.is_null() { Value::from("<none>") } else { v },
        ));
        assert_eq!(persist(Value::Null, &column), Value::from(""));
        assert_eq!(hydrate(Value::Null, &column), Value::from("<none>"));
    }

    #[test]
    fn transformers_run_in_order_and_reverse() {
        let column = ColumnModel::new("a", "varchar")
            .transformer(FnTransformer::new(
                "append-a",
                |v| Value::Text(format!("{}a", v.stringify())),
                |v| Value::Text(v.stringify().trim_end_matches('a').to_string()),
            ))
            .transformer(FnTransformer::new(
                "append-b",
                |v| Value::Text(format!("{}b", v.stringify())),
                |v| Value::Text(v.stringify().trim_end_matches('b').to_string()),
            ));
        assert_eq!(persist(Value::from("x"), &column), Value::from("xab"));
        assert_eq!(hydrate(Value::from("xab"), &column), Value::from("x"));
    }

    #[test]
    fn transformer_runs_after_type_hydration() {
        let column = ColumnModel::new("flags", "simple-array").transformer(FnTransformer::new(
            "count",
            |v| v,
            |v| match v {
                Value::Array(items) => Value::UInt(items.len() as u64),
                other => other,
            },
        ));
        assert_eq!(hydrate(Value::from("a,b,c"), &column), Value::UInt(3));
    }

    #[test]
    fn datetime_wire_text_without_marker_is_utc() {
        let column = ColumnModel::new("created", "datetime");
        assert_eq!(
            hydrate(Value::from("2024-01-02 03:04:05"), &column),
            Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        );
    }

    #[test]
    fn numbers_are_parsed_when_numeric_like() {
        let column = ColumnModel::new("n", NativeType::Number);
        assert_eq!(persist(Value::from("42"), &column), Value::Int(42));
        assert_eq!(persist(Value::Float(7.9), &column), Value::Int(7));
        assert_eq!(persist(Value::from("n/a"), &column), Value::from("n/a"));
        assert_eq!(hydrate(Value::from("42"), &column), Value::Int(42));
        assert_eq!(hydrate(Value::from("n/a"), &column), Value::from("n/a"));
    }

    #[test]
    fn enums_coerce_to_declared_integer_members() {
        let column = ColumnModel::new("level", "enum").enum_values([1_i64, 2, 3]);
        assert_eq!(persist(Value::Int(2), &column), Value::from("2"));
        assert_eq!(hydrate(Value::from("2"), &column), Value::Int(2));
        assert_eq!(hydrate(Value::from("9"), &column), Value::from("9"));

        let text = ColumnModel::new("role", "enum").enum_values(["1", "admin"]);
        assert_eq!(hydrate(Value::from("1"), &text), Value::from("1"));
    }

    #[test]
    fn bit_columns_decode_wire_bytes() {
        let column = ColumnModel::new("mask", "bit");
        assert_eq!(hydrate(Value::Bytes(vec![0x01, 0x02]), &column), Value::UInt(258));
        assert_eq!(hydrate(Value::UInt(7), &column), Value::UInt(7));
        assert_eq!(hydrate(Value::Float(1.0), &column), Value::UInt(0));
    }

    #[test]
    fn json_parse_failure_degrades() {
        let column = ColumnModel::new("doc", "json");
        assert_eq!(hydrate(Value::from("{oops"), &column), Value::from("{oops"));
    }

    #[test]
    fn empty_list_text_is_empty_array() {
        let column = ColumnModel::new("tags", "simple-array");
        assert_eq!(hydrate(Value::from(""), &column), Value::Array(vec![]));
    }
}
