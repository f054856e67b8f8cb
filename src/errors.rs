//! Error types for the pinmark application.
//!
//! This module defines the error type shared by the location engine, its
//! collaborators and the command line front end.

use std::io;

use thiserror::Error;

/// The main error type for the pinmark application.
#[derive(Error, Debug)]
pub enum PinError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport failures while talking to the geocoding service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The geocoding service could not resolve the coordinates.
    #[error("Could not get requested location: {message}")]
    Geocode { message: String },

    /// The geocoding service did not answer in time.
    #[error("Geocoding lookup timed out after {secs}s")]
    GeocodeTimeout { secs: u64 },

    /// The persisted blob could not be decoded.
    #[error("Stored locations are unreadable: {message}")]
    Decode { message: String },

    /// A location with the same ID is already in the store.
    #[error("Location already exists: {id}")]
    DuplicateId { id: String },

    /// Location was not found when performing an operation.
    #[error("Location not found: {id}")]
    NotFound { id: String },

    /// A marker was requested before the map finished loading.
    #[error("Map is not ready yet")]
    MapNotReady,

    /// Coordinates given on the command line could not be parsed.
    #[error("Invalid coordinates: {input}")]
    InvalidCoords { input: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl PinError {
    /// The underlying cause without the variant's own prefix, for callers
    /// that wrap the error in a message of their own.
    pub fn reason(&self) -> String {
        match self {
            PinError::Geocode { message }
            | PinError::Decode { message }
            | PinError::ConfigError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
