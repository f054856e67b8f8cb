//! Persistence codec for the location collection.
//!
//! The blob is a JSON array of records:
//! `{id, coords: [lat, lng], country, description, date, dateDescription}`.
//! Dates are written as ISO-8601 with millisecond precision; anything finer is
//! truncated on both encode and decode so a round trip is always exact.
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Coords, Location, PinError, Result};

#[derive(Serialize)]
struct StoredLocation<'a> {
    id: &'a str,
    coords: Coords,
    country: &'a str,
    description: &'a str,
    date: String,
    #[serde(rename = "dateDescription")]
    date_description: &'a str,
}

/// Every field is optional here; [`decode`] decides what is fatal for a record.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    coords: Option<Coords>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default, rename = "dateDescription")]
    date_description: Option<String>,
}

/// Serializes the collection, preserving its order.
pub fn encode(locations: &[Location]) -> Result<String> {
    let records: Vec<StoredLocation<'_>> = locations
        .iter()
        .map(|location| StoredLocation {
            id: location.id(),
            coords: location.coords(),
            country: location.country(),
            description: location.description(),
            date: location
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            date_description: location.display_label(),
        })
        .collect();

    serde_json::to_string(&records).map_err(|e| {
        error!("Failed to serialize locations: {}", e);
        PinError::Serialization(e)
    })
}

/// Rebuilds the collection from a stored blob.
///
/// An absent, blank or `null` blob is an empty collection. A blob that is not
/// a JSON array is a [`PinError::Decode`]. Inside a valid array, records with
/// no usable `id`, `coords` or `date` are dropped with a warning and the rest
/// are kept.
pub fn decode(blob: Option<&str>) -> Result<Vec<Location>> {
    let blob = match blob.map(str::trim) {
        Some(blob) if !blob.is_empty() => blob,
        _ => {
            debug!("No stored locations found");
            return Ok(Vec::new());
        }
    };

    let value: Value = serde_json::from_str(blob).map_err(|e| PinError::Decode {
        message: e.to_string(),
    })?;

    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(PinError::Decode {
                message: format!("expected an array of locations, found {}", kind_of(&other)),
            })
        }
    };

    let total = entries.len();
    let locations: Vec<Location> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match decode_record(entry) {
            Ok(location) => Some(location),
            Err(reason) => {
                warn!("Dropping stored location #{}: {}", index, reason);
                None
            }
        })
        .collect();

    if locations.len() < total {
        warn!(
            "Recovered {} of {} stored locations",
            locations.len(),
            total
        );
    }

    Ok(locations)
}

fn decode_record(entry: Value) -> std::result::Result<Location, String> {
    let raw: RawRecord = serde_json::from_value(entry).map_err(|e| e.to_string())?;

    let id = raw
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "missing id".to_string())?;

    let coords = raw
        .coords
        .filter(Coords::is_finite)
        .ok_or_else(|| format!("location {} has no usable coords", id))?;

    let date = raw
        .date
        .ok_or_else(|| format!("location {} has no date", id))?;
    let created_at = DateTime::parse_from_rfc3339(&date)
        .map_err(|e| format!("location {} has an invalid date {:?}: {}", id, date, e))?
        .with_timezone(&Utc);
    let created_at =
        DateTime::from_timestamp_millis(created_at.timestamp_millis()).unwrap_or(created_at);

    Ok(Location::reconstruct(
        id,
        coords,
        raw.country.unwrap_or_default(),
        raw.description.unwrap_or_default(),
        created_at,
        raw.date_description,
    ))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
