//! Resolvers backed by local JSON files.
//!
//! An unreadable path is MISSING. Content that is not JSON, is an empty
//! object or array, or lacks the fields a resolver needs is FORMAT.

use std::fs;

use crate::{
    error::ResolveError,
    model::{Coordinate, Forecast, PlaceRecord, display_name, wire::ForecastDocument},
};

fn read_json(path: &str) -> Result<serde_json::Value, ResolveError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        tracing::debug!(path, error = %e, "cannot read file");
        ResolveError::missing(path)
    })?;

    let value: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
        tracing::debug!(path, error = %e, "file is not JSON");
        ResolveError::format(path)
    })?;

    let empty = match &value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(fields) => fields.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ResolveError::format(path));
    }

    Ok(value)
}

/// Coordinate of the first record in a forward-geocoding result file.
pub fn resolve_from_file(path: &str) -> Result<Coordinate, ResolveError> {
    let records: Vec<PlaceRecord> =
        serde_json::from_value(read_json(path)?).map_err(|_| ResolveError::format(path))?;

    records
        .first()
        .and_then(PlaceRecord::coordinate)
        .ok_or_else(|| ResolveError::format(path))
}

/// Address of a reverse-geocoding result file, or `Address Not Found`.
pub fn describe_reverse_from_file(path: &str) -> Result<String, ResolveError> {
    display_name(&read_json(path)?).ok_or_else(|| ResolveError::format(path))
}

/// Hourly forecast stored in the National Weather Service document format.
pub fn load_from_file(path: &str) -> Result<Forecast, ResolveError> {
    let value = read_json(path)?;
    serde_json::from_value::<ForecastDocument>(value)
        .map_err(anyhow::Error::from)
        .and_then(Forecast::try_from)
        .map_err(|e| {
            tracing::debug!(path, error = %e, "unusable forecast file");
            ResolveError::format(path)
        })
}
