//! The authoritative in-memory location collection.
//!
//! Locations are kept newest-first, which is also the order they are listed
//! and persisted in. Ids are unique; every mutation checks it.
use std::collections::HashSet;

use log::{debug, error, warn};

use crate::{Location, PinError, Result};

/// Ordered, id-unique collection of locations
#[derive(Debug, Default)]
pub struct LocationStore {
    locations: Vec<Location>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a location at the front.
    ///
    /// # Errors
    ///
    /// [`PinError::DuplicateId`] if a location with the same id is present;
    /// the store is left unchanged.
    pub fn add(&mut self, location: Location) -> Result<()> {
        if self.find(location.id()).is_some() {
            error!("Refusing to add duplicate location {}", location.id());
            return Err(PinError::DuplicateId {
                id: location.id().to_string(),
            });
        }

        debug!("Adding location {} to store", location.id());
        self.locations.insert(0, location);
        Ok(())
    }

    /// Removes and returns the location with the given id.
    ///
    /// # Errors
    ///
    /// [`PinError::NotFound`] if no such location exists.
    pub fn remove(&mut self, id: &str) -> Result<Location> {
        match self.locations.iter().position(|location| location.id() == id) {
            Some(index) => {
                debug!("Removing location {} from store", id);
                Ok(self.locations.remove(index))
            }
            None => Err(PinError::NotFound { id: id.to_string() }),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|location| location.id() == id)
    }

    /// Replaces the whole collection with previously persisted locations.
    ///
    /// Duplicate ids keep their first occurrence. Returns how many were dropped.
    pub fn hydrate(&mut self, locations: Vec<Location>) -> usize {
        let total = locations.len();
        let mut seen = HashSet::with_capacity(total);

        self.locations = locations
            .into_iter()
            .filter(|location| {
                let fresh = seen.insert(location.id().to_string());
                if !fresh {
                    warn!("Skipping duplicate stored location {}", location.id());
                }
                fresh
            })
            .collect();

        let dropped = total - self.locations.len();
        debug!(
            "Hydrated store with {} locations ({} duplicates dropped)",
            self.locations.len(),
            dropped
        );
        dropped
    }

    /// All locations, newest first
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
