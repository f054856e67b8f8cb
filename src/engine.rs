//! The location engine.
//!
//! `Engine` owns the store, the marker registry, the blob store and the
//! presenter, and is the only thing that mutates them. Every public mutation
//! runs `store -> markers -> list -> storage` to completion before returning,
//! so callers never see the three views disagree.
//!
//! Reverse lookups are the one asynchronous step. They are split into
//! [`Engine::begin_acquisition`] and [`Engine::finish_acquisition`] so an
//! event loop can keep several lookups in flight without lending the engine
//! out across an await.
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::{
    codec, lookup, Attempt, AttemptOutcome, BlobStore, Coords, Geocoder, Location,
    LocationStore, MapProvider, MarkerRegistry, Notice, PinError, Place, Presenter, Result,
    SupersededLookups,
};

/// Tunables the engine needs from the application configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Key of the blob holding the location collection
    pub storage_key: String,
    /// Zoom level used when centering the map on a location
    pub zoom_level: u8,
    /// Whether stale lookups may still commit
    pub superseded_lookups: SupersededLookups,
    /// Upper bound for a single reverse lookup, if any
    pub lookup_timeout: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            storage_key: "locations".to_string(),
            zoom_level: 13,
            superseded_lookups: SupersededLookups::Commit,
            lookup_timeout: None,
        }
    }
}

pub struct Engine {
    settings: EngineSettings,
    store: LocationStore,
    markers: MarkerRegistry,
    blobs: Box<dyn BlobStore>,
    presenter: Box<dyn Presenter>,
    /// Generation of the most recently started attempt
    latest_generation: u64,
    /// Attempts started but not finished
    pending: usize,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        blobs: Box<dyn BlobStore>,
        map: Box<dyn MapProvider>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            settings,
            store: LocationStore::new(),
            markers: MarkerRegistry::new(map),
            blobs,
            presenter,
            latest_generation: 0,
            pending: 0,
        }
    }

    /// Hydrates the store from storage and draws everything.
    ///
    /// Unreadable storage is reported to the user and treated as empty; it is
    /// not overwritten until the next mutation. Returns the number of
    /// locations loaded.
    pub fn start(&mut self) -> usize {
        let key = self.settings.storage_key.clone();
        info!("Loading stored locations from '{}'", key);

        let blob = match self.blobs.load(&key) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to read stored locations: {}", e);
                self.presenter
                    .notify(&Notice::StorageUnreadable(e.reason()));
                None
            }
        };

        let locations = match codec::decode(blob.as_deref()) {
            Ok(locations) => locations,
            Err(e) => {
                warn!("Ignoring unreadable stored locations: {}", e);
                self.presenter
                    .notify(&Notice::StorageUnreadable(e.reason()));
                Vec::new()
            }
        };

        let dropped = self.store.hydrate(locations);
        if dropped > 0 {
            warn!("Dropped {} duplicate stored locations", dropped);
        }

        self.presenter.show_list(self.store.locations());
        self.render_missing_markers();

        info!("Engine started with {} locations", self.store.len());
        self.store.len()
    }

    /// Draws markers for every location that has none yet.
    ///
    /// Call once the map finished loading; locations hydrated or committed
    /// before that have no marker. Returns how many markers were drawn.
    pub fn map_ready(&mut self) -> usize {
        info!("Map ready, drawing stored locations");
        self.render_missing_markers()
    }

    fn render_missing_markers(&mut self) -> usize {
        if !self.markers.map_is_ready() {
            debug!("Map not ready, deferring markers");
            return 0;
        }

        let before = self.markers.len();
        for location in self.store.locations() {
            if self.markers.handle(location.id()).is_none() {
                self.markers.render(location);
            }
        }
        self.markers.len() - before
    }

    /// Starts a new acquisition attempt for a map click.
    pub fn begin_acquisition(&mut self, coords: Coords) -> Attempt {
        self.latest_generation += 1;
        self.pending += 1;
        if self.pending == 1 {
            self.presenter.set_busy(true);
        }

        debug!(
            "Acquisition #{} started at {}",
            self.latest_generation, coords
        );
        Attempt::new(self.latest_generation, coords)
    }

    /// Completes an attempt with the result of its reverse lookup.
    ///
    /// A successful lookup creates the location at the attempt's own
    /// coordinates and commits it. A failed one leaves the store untouched
    /// and shows a notice.
    pub fn finish_acquisition(
        &mut self,
        attempt: Attempt,
        result: Result<Place>,
    ) -> AttemptOutcome {
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            self.presenter.set_busy(false);
        }

        if self.settings.superseded_lookups == SupersededLookups::Discard
            && attempt.generation() < self.latest_generation
        {
            debug!(
                "Discarding acquisition #{}, superseded by #{}",
                attempt.generation(),
                self.latest_generation
            );
            return AttemptOutcome::Discarded {
                generation: attempt.generation(),
            };
        }

        let place = match result {
            Ok(place) => place,
            Err(e) => {
                warn!(
                    "Acquisition #{} at {} failed: {}",
                    attempt.generation(),
                    attempt.coords(),
                    e
                );
                self.presenter.notify(&Notice::LookupFailed(e.reason()));
                return AttemptOutcome::Failed(e);
            }
        };

        let location = Location::create(attempt.coords(), place.country, place.description);
        self.commit(attempt, location)
    }

    fn commit(&mut self, attempt: Attempt, location: Location) -> AttemptOutcome {
        match self.add_location(location.clone()) {
            Ok(()) => {
                info!(
                    "Acquisition #{} committed location {}",
                    attempt.generation(),
                    location.id()
                );
                AttemptOutcome::Committed(location)
            }
            Err(e) => {
                error!(
                    "Acquisition #{} could not be committed: {}",
                    attempt.generation(),
                    e
                );
                self.presenter.notify(&Notice::LookupFailed(e.reason()));
                AttemptOutcome::Failed(e)
            }
        }
    }

    /// Runs a whole acquisition: begin, look up, finish.
    pub async fn acquire(&mut self, geocoder: &dyn Geocoder, coords: Coords) -> AttemptOutcome {
        let attempt = self.begin_acquisition(coords);
        let result = lookup(geocoder, coords, self.settings.lookup_timeout).await;
        self.finish_acquisition(attempt, result)
    }

    /// Adds a location, draws it and persists the collection.
    ///
    /// # Errors
    ///
    /// [`PinError::DuplicateId`] if the id is already taken; nothing changes.
    pub fn add_location(&mut self, location: Location) -> Result<()> {
        let id = location.id().to_string();
        self.store.add(location)?;

        if let Some(location) = self.store.find(&id) {
            self.markers.render(location);
            self.presenter.location_added(location);
        }

        self.persist();
        Ok(())
    }

    /// Deletes a location together with its marker and persists the result.
    ///
    /// # Errors
    ///
    /// [`PinError::NotFound`] if no such location exists; storage is not
    /// touched in that case.
    pub fn delete_location(&mut self, id: &str) -> Result<Location> {
        let location = self.store.remove(id).map_err(|e| {
            warn!("Ignoring delete of unknown location {}", id);
            e
        })?;

        self.markers.remove(id);
        self.presenter.location_removed(id);
        self.persist();

        info!("Location {} deleted", id);
        Ok(location)
    }

    /// Centers the map on a location.
    pub fn focus(&mut self, id: &str) -> Result<&Location> {
        let location = self
            .store
            .find(id)
            .ok_or_else(|| PinError::NotFound { id: id.to_string() })?;

        self.markers
            .pan_to(location.coords(), self.settings.zoom_level);
        Ok(location)
    }

    /// Removes every marker from the map, e.g. before the map is torn down.
    pub fn clear_markers(&mut self) {
        self.markers.remove_all();
    }

    // Storage failures do not undo the in-memory change; the user is told and
    // the next successful save writes the full collection again.
    fn persist(&mut self) -> bool {
        let saved = codec::encode(self.store.locations())
            .and_then(|blob| self.blobs.save(&self.settings.storage_key, &blob));

        match saved {
            Ok(()) => {
                debug!("Persisted {} locations", self.store.len());
                true
            }
            Err(e) => {
                error!("Failed to persist locations: {}", e);
                self.presenter
                    .notify(&Notice::StorageWriteFailed(e.reason()));
                false
            }
        }
    }

    /// All locations, newest first
    pub fn locations(&self) -> &[Location] {
        self.store.locations()
    }

    pub fn find(&self, id: &str) -> Option<&Location> {
        self.store.find(id)
    }

    pub fn has_marker(&self, id: &str) -> bool {
        self.markers.handle(id).is_some()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Lookups started and not yet finished
    pub fn pending_lookups(&self) -> usize {
        self.pending
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
