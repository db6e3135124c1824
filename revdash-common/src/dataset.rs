//! Fallback review dataset
//!
//! The static dataset is a JSON document shaped like a Hostaway response:
//! `{ "status": "success", "result": [ ...raw reviews... ] }`. A bare array is
//! accepted too.

use serde_json::Value;
use std::path::Path;

use crate::{Error, Result};

/// Read and parse the dataset document
pub async fn load_dataset(path: &Path) -> Result<Value> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("review dataset {}", path.display()))
        } else {
            Error::Io(e)
        }
    })?;

    let document = serde_json::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "Loaded review dataset");
    Ok(document)
}

/// Raw review records inside a dataset document
pub fn records(document: &Value) -> &[Value] {
    let list = match document {
        Value::Array(items) => Some(items),
        _ => document.get("result").and_then(Value::as_array),
    };
    list.map(Vec::as_slice).unwrap_or(&[])
}

/// Mutable access to the record list, for approval write-back
pub fn records_mut(document: &mut Value) -> Option<&mut Vec<Value>> {
    if document.is_array() {
        return document.as_array_mut();
    }
    document.get_mut("result").and_then(Value::as_array_mut)
}
