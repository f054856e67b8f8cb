//! The location entity.
//!
//! A `Location` is created once per successful acquisition and never edited
//! afterwards. Hydration from storage goes through [`Location::reconstruct`],
//! which keeps the original identity and timestamp.
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::Coords;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A marked point on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    id: String,
    coords: Coords,
    country: String,
    description: String,
    created_at: DateTime<Utc>,
    display_label: String,
}

impl Location {
    /// Creates a brand new location stamped with the current time.
    ///
    /// The creation time is truncated to whole milliseconds, which is the
    /// precision the storage format keeps. The label is computed here and
    /// stored; it is not re-derived later.
    pub fn create(
        coords: Coords,
        country: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let created_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let country = country.into();

        Location {
            id: generate_id(&created_at),
            coords,
            display_label: display_label(&country, &created_at),
            country,
            description: description.into(),
            created_at,
        }
    }

    /// Rebuilds a location from persisted fields without minting a new identity.
    ///
    /// A stored label is trusted as-is so records keep the text they were
    /// created with; a missing or empty one is recomputed from `country` and
    /// `created_at`.
    pub fn reconstruct(
        id: String,
        coords: Coords,
        country: String,
        description: String,
        created_at: DateTime<Utc>,
        stored_label: Option<String>,
    ) -> Self {
        let display_label = match stored_label {
            Some(label) if !label.is_empty() => label,
            _ => display_label(&country, &created_at),
        };

        Location {
            id,
            coords,
            country,
            description,
            created_at,
            display_label,
        }
    }

    /// Returns a copy whose label is recomputed with the current format.
    pub fn with_refreshed_label(mut self) -> Self {
        self.display_label = display_label(&self.country, &self.created_at);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Popup text, e.g. `United Kingdom on Oct, 19`
    pub fn display_label(&self) -> &str {
        &self.display_label
    }
}

// Millisecond timestamp plus a per-process sequence, so back-to-back clicks
// inside the same millisecond still get distinct ids.
fn generate_id(created_at: &DateTime<Utc>) -> String {
    let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", created_at.timestamp_millis(), sequence)
}

fn display_label(country: &str, created_at: &DateTime<Utc>) -> String {
    format!(
        "{} on {}",
        country,
        created_at.with_timezone(&Local).format("%b, %-d")
    )
}
