//! Marker bookkeeping between the store and the map.
//!
//! The map provider owns the visual markers; the registry only remembers which
//! handle belongs to which location id, and guarantees at most one live handle
//! per id.
use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::{Coords, Location, PinError, Result};

/// Opaque reference to a marker drawn by a [`MapProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// The interactive map that draws markers.
pub trait MapProvider: Send {
    /// Whether the map finished loading and can draw.
    fn is_ready(&self) -> bool;

    /// Draws a marker with a popup.
    ///
    /// Returns [`PinError::MapNotReady`] when called before the map loaded.
    fn render_marker(&mut self, coords: Coords, content: &str) -> Result<MarkerHandle>;

    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Re-centers the map.
    fn pan_to(&mut self, coords: Coords, zoom: u8);
}

/// Tracks `location id -> marker handle` on top of a map provider
pub struct MarkerRegistry {
    map: Box<dyn MapProvider>,
    handles: HashMap<String, MarkerHandle>,
}

impl MarkerRegistry {
    pub fn new(map: Box<dyn MapProvider>) -> Self {
        Self {
            map,
            handles: HashMap::new(),
        }
    }

    /// Draws the marker for a location, replacing any marker it already has.
    ///
    /// If the map is not ready the render is dropped and logged; the location
    /// simply has no marker until [`MarkerRegistry::render`] is called again.
    pub fn render(&mut self, location: &Location) {
        self.remove(location.id());

        match self
            .map
            .render_marker(location.coords(), location.display_label())
        {
            Ok(handle) => {
                trace!("Marker {:?} rendered for {}", handle, location.id());
                self.handles.insert(location.id().to_string(), handle);
            }
            Err(PinError::MapNotReady) => {
                warn!(
                    "Map not ready, marker for {} was not rendered",
                    location.id()
                );
            }
            Err(e) => {
                warn!("Failed to render marker for {}: {}", location.id(), e);
            }
        }
    }

    /// Removes the marker of a location. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) {
        if let Some(handle) = self.handles.remove(id) {
            debug!("Removing marker {:?} of {}", handle, id);
            self.map.remove_marker(handle);
        }
    }

    /// Removes every marker this registry created.
    pub fn remove_all(&mut self) {
        for (id, handle) in self.handles.drain() {
            trace!("Removing marker {:?} of {}", handle, id);
            self.map.remove_marker(handle);
        }
    }

    pub fn handle(&self, id: &str) -> Option<MarkerHandle> {
        self.handles.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn map_is_ready(&self) -> bool {
        self.map.is_ready()
    }

    pub fn pan_to(&mut self, coords: Coords, zoom: u8) {
        self.map.pan_to(coords, zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMap;

    fn location(id: &str, lat: f64) -> Location {
        Location::reconstruct(
            id.to_string(),
            Coords::new(lat, 0.0),
            "Country".to_string(),
            String::new(),
            chrono::Utc::now(),
            Some(format!("label {}", id)),
        )
    }

    #[test]
    fn render_records_handle_and_popup() {
        let map = RecordingMap::ready();
        let mut registry = MarkerRegistry::new(Box::new(map.clone()));

        registry.render(&location("a", 10.0));

        assert!(registry.handle("a").is_some());
        assert_eq!(
            map.live_markers(),
            vec![(Coords::new(10.0, 0.0), "label a".to_string())]
        );
    }

    #[test]
    fn rerender_replaces_existing_marker() {
        let map = RecordingMap::ready();
        let mut registry = MarkerRegistry::new(Box::new(map.clone()));

        registry.render(&location("a", 10.0));
        let first = registry.handle("a");
        registry.render(&location("a", 10.0));

        assert_ne!(registry.handle("a"), first);
        assert_eq!(registry.len(), 1);
        assert_eq!(map.live_count(), 1);
    }

    #[test]
    fn render_before_map_ready_is_dropped() {
        let map = RecordingMap::not_ready();
        let mut registry = MarkerRegistry::new(Box::new(map.clone()));

        registry.render(&location("a", 10.0));

        assert!(registry.is_empty());
        assert_eq!(map.live_count(), 0);
    }

    #[test]
    fn remove_unknown_id_is_a_no_op() {
        let map = RecordingMap::ready();
        let mut registry = MarkerRegistry::new(Box::new(map.clone()));
        registry.render(&location("a", 10.0));

        registry.remove("missing");
        assert_eq!(map.live_count(), 1);

        registry.remove("a");
        assert_eq!(map.live_count(), 0);
        assert!(registry.handle("a").is_none());
    }

    #[test]
    fn remove_all_clears_the_map() {
        let map = RecordingMap::ready();
        let mut registry = MarkerRegistry::new(Box::new(map.clone()));
        registry.render(&location("a", 1.0));
        registry.render(&location("b", 2.0));

        registry.remove_all();
        assert_eq!(map.live_count(), 0);
        assert!(registry.is_empty());
    }
}
