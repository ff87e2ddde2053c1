//! Generated values reported back by an insert.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::column::{ColumnModel, EntityModel, GenerationStrategy};
use crate::value::{parse_number, Value};

/// What the server returned for an `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertResult {
    /// An OK packet. `insert_id` is the first id allocated by the
    /// statement; a falsy id means nothing was allocated.
    Ok {
        /// First auto-increment id of the statement.
        insert_id: Value,
        /// Rows written.
        affected_rows: u64,
    },
    /// Generated values keyed by database column name (e.g. from
    /// `INSERT .. RETURNING`).
    Columns(BTreeMap<String, Value>),
}

/// A node of a [`GeneratedMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapNode {
    /// A generated value.
    Value(Value),
    /// An embedded object.
    Nested(GeneratedMap),
}

/// Generated values keyed by property path.
///
/// Columns inside embedded objects produce nested maps, so two columns of
/// the same embedded object end up under one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GeneratedMap(BTreeMap<String, MapNode>);

impl GeneratedMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the single-column map for `column` holding `value`.
    #[must_use]
    pub fn for_column(column: &ColumnModel, value: Value) -> Self {
        let leaf = Self(BTreeMap::from([(column.name.clone(), MapNode::Value(value))]));
        column
            .embedded_path
            .iter()
            .rev()
            .fold(leaf, |inner, property| {
                Self(BTreeMap::from([(property.clone(), MapNode::Nested(inner))]))
            })
    }

    /// Returns `true` if nothing was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the node stored under a top-level property.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&MapNode> {
        self.0.get(property)
    }

    /// Follows a property path down to a value.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut map = self;
        for property in parents {
            match map.0.get(*property)? {
                MapNode::Nested(inner) => map = inner,
                MapNode::Value(_) => return None,
            }
        }
        match map.0.get(*last)? {
            MapNode::Value(value) => Some(value),
            MapNode::Nested(_) => None,
        }
    }

    /// Deep-merges `other` into `self`. Values from `other` replace
    /// values already present at the same path.
    pub fn merge(&mut self, other: Self) {
        for (property, node) in other.0 {
            match (self.0.get_mut(&property), node) {
                (Some(MapNode::Nested(existing)), MapNode::Nested(incoming)) => {
                    existing.merge(incoming);
                }
                (_, node) => {
                    self.0.insert(property, node);
                }
            }
        }
    }

    /// Converts the map into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(property, node)| {
                    let json = match node {
                        MapNode::Value(value) => value.to_json(),
                        MapNode::Nested(inner) => inner.to_json(),
                    };
                    (property.clone(), json)
                })
                .collect(),
        )
    }
}

/// Builds the generated-value map for the entity at `index` of a batch
/// insert.
///
/// A multi-row insert only reports the first allocated id; the entity at
/// `index` is assumed to have received `insert_id + index`. That holds
/// for a single statement under the default auto-increment lock mode, not
/// for ids interleaved by concurrent writers. UUID columns are filled in
/// by the application before the insert and are never mapped here.
#[must_use]
pub fn create_generated_map(
    entity: &EntityModel,
    result: Option<&InsertResult>,
    index: usize,
) -> Option<GeneratedMap> {
    let mut map = GeneratedMap::new();
    match result? {
        InsertResult::Columns(values) => {
            for (name, value) in values {
                if let Some(column) = entity.column_by_database_name(name) {
                    map.merge(GeneratedMap::for_column(column, value.clone()));
                }
            }
        }
        InsertResult::Ok { insert_id, .. } => {
            let Some(first_id) = parse_insert_id(insert_id) else {
                debug!(table = %entity.table_name, "insert reported no generated id");
                return None;
            };
            for column in entity.generated_columns() {
                debug_assert!(
                    column.generation_strategy.is_some(),
                    "generated column '{}' has no generation strategy",
                    column.name
                );
                if column.generation_strategy == Some(GenerationStrategy::Increment) {
                    map.merge(increment_value(column, first_id, index));
                }
            }
        }
    }
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn increment_value(column: &ColumnModel, first_id: u64, index: usize) -> GeneratedMap {
    let id = u64::try_from(index)
        .ok()
        .and_then(|offset| first_id.checked_add(offset))
        .map_or(Value::Null, Value::UInt);
    GeneratedMap::for_column(column, id)
}

/// 2^64 as a float; larger ids do not fit a `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Reads the insert id; zero, null and non-numeric ids count as absent.
fn parse_insert_id(insert_id: &Value) -> Option<u64> {
    let number = match insert_id {
        Value::Text(text) => parse_number(text)?,
        other => other.clone(),
    };
    match number {
        Value::Int(n) => u64::try_from(n).ok(),
        Value::UInt(n) => Some(n),
        Value::Float(f) if f.is_finite() && f >= 1.0 && f < U64_LIMIT => Some(f.trunc() as u64),
        _ => None,
    }
    .filter(|id| *id != 0)
}
