//! JSON inputs of the CLI: entity files, live column snapshots and query
//! parameters.

use std::collections::BTreeMap;
use std::path::Path;

use rowbridge_core::{EntityModel, LiveColumn, Parameter, Value};
use serde::de::DeserializeOwned;

use crate::error::{IntrospectError, Result};

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&text).map_err(|source| IntrospectError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an entity model from a JSON file.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or
/// [`IntrospectError::Parse`] if it is not a valid entity.
pub async fn read_entity(path: &Path) -> Result<EntityModel> {
    let text = tokio::fs::read_to_string(path).await?;
    EntityModel::from_json(&text).map_err(|source| IntrospectError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a live column snapshot (as printed by `rowbridge introspect`).
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or
/// [`IntrospectError::Parse`] if it is not a list of columns.
pub async fn read_live_columns(path: &Path) -> Result<Vec<LiveColumn>> {
    read_json(path).await
}

/// Parses named query parameters from a JSON object.
///
/// Arrays become list parameters for `:...name`, objects of the form
/// `{"sql": "..."}` become raw SQL, anything else is bound as a value.
///
/// # Errors
///
/// Returns [`IntrospectError::Serialization`] unless `json` is an object.
pub fn parse_parameters(json: &str) -> Result<BTreeMap<String, Parameter>> {
    let object: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    Ok(object
        .into_iter()
        .map(|(name, value)| {
            let parameter = match value.get("sql").and_then(serde_json::Value::as_str) {
                Some(sql) => Parameter::raw(sql),
                None => Parameter::Value(Value::from(value)),
            };
            (name, parameter)
        })
        .collect())
}
