//! Core data structures for the pinmark application.
//!
//! This module contains the small value types passed between the engine and
//! its collaborators, plus the CLI subcommands.
use std::fmt;

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::{Location, PinError};

/// A specialized Result type for pinmark operations.
pub type Result<T> = std::result::Result<T, PinError>;

/// A latitude/longitude pair, stored as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(coords: Coords) -> Self {
        [coords.lat, coords.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// What the geocoding service told us about a pair of coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    /// Country name, empty when the service did not report one
    pub country: String,
    /// Free-text address detail
    pub description: String,
}

/// A user-visible, non-blocking message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A reverse lookup failed; nothing was added
    LookupFailed(String),
    /// The persisted collection could not be read and was ignored
    StorageUnreadable(String),
    /// The collection changed in memory but could not be written out
    StorageWriteFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LookupFailed(reason) => {
                write!(f, "Could not get requested location ({})", reason)
            }
            Notice::StorageUnreadable(reason) => {
                write!(f, "Saved locations could not be loaded ({})", reason)
            }
            Notice::StorageWriteFailed(reason) => {
                write!(f, "Locations could not be saved ({})", reason)
            }
        }
    }
}

/// One click-to-commit sequence that is waiting for its reverse lookup.
///
/// Attempts are created by [`crate::Engine::begin_acquisition`] and carry the
/// coordinates of their own click, so lookups that resolve out of order still
/// commit the right position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    generation: u64,
    coords: Coords,
}

impl Attempt {
    pub(crate) fn new(generation: u64, coords: Coords) -> Self {
        Self { generation, coords }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }
}

/// How an acquisition attempt ended
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The location was added, rendered and persisted
    Committed(Location),
    /// The lookup failed; the store is unchanged
    Failed(PinError),
    /// A newer attempt superseded this one and the result was dropped
    Discarded { generation: u64 },
}

/// What to do with lookups that finish after a newer click was made
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupersededLookups {
    /// Every finished lookup commits its own location
    #[default]
    Commit,
    /// Only the most recent attempt may commit
    Discard,
}

/// Available subcommands for the pinmark application
#[derive(Subcommand)]
pub enum Commands {
    /// Mark one or more points, e.g. `add 51.5,-0.12 48.85,2.35`
    Add {
        /// Coordinates as `lat,lng`
        #[clap(required = true, allow_hyphen_values = true)]
        points: Vec<String>,
    },

    /// List marked locations, newest first
    List {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Center the map on a location and print its details
    Show {
        /// ID of the location
        id: String,
    },

    /// Delete a location by ID
    Delete {
        /// ID of the location to delete
        id: String,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_serialize_as_pair() {
        let coords = Coords::new(51.5, -0.12);
        assert_eq!(serde_json::to_string(&coords).unwrap(), "[51.5,-0.12]");

        let back: Coords = serde_json::from_str("[51.5,-0.12]").unwrap();
        assert_eq!(back, coords);
    }

    #[test]
    fn superseded_policy_uses_lowercase_names() {
        let policy: SupersededLookups = serde_json::from_str("\"discard\"").unwrap();
        assert_eq!(policy, SupersededLookups::Discard);
        assert_eq!(SupersededLookups::default(), SupersededLookups::Commit);
    }
}
