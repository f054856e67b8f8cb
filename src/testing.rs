//! Recording doubles for the engine's collaborators.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    BlobStore, Coords, Geocoder, Location, MapProvider, MarkerHandle, Notice, PinError, Place,
    Presenter, Result,
};

#[derive(Default)]
struct MapState {
    ready: bool,
    next_handle: u64,
    live: Vec<(MarkerHandle, Coords, String)>,
    pans: Vec<(Coords, u8)>,
}

/// Map double; clones share state so tests can inspect what the engine drew.
#[derive(Clone, Default)]
pub struct RecordingMap {
    state: Arc<Mutex<MapState>>,
}

impl RecordingMap {
    pub fn ready() -> Self {
        let map = Self::default();
        map.set_ready(true);
        map
    }

    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.lock().unwrap().ready = ready;
    }

    pub fn live_markers(&self) -> Vec<(Coords, String)> {
        self.state
            .lock()
            .unwrap()
            .live
            .iter()
            .map(|(_, coords, content)| (*coords, content.clone()))
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub fn pans(&self) -> Vec<(Coords, u8)> {
        self.state.lock().unwrap().pans.clone()
    }
}

impl MapProvider for RecordingMap {
    fn is_ready(&self) -> bool {
        self.state.lock().unwrap().ready
    }

    fn render_marker(&mut self, coords: Coords, content: &str) -> Result<MarkerHandle> {
        let mut state = self.state.lock().unwrap();
        if !state.ready {
            return Err(PinError::MapNotReady);
        }
        state.next_handle += 1;
        let handle = MarkerHandle(state.next_handle);
        state.live.push((handle, coords, content.to_string()));
        Ok(handle)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        let mut state = self.state.lock().unwrap();
        state.live.retain(|(live, _, _)| *live != handle);
    }

    fn pan_to(&mut self, coords: Coords, zoom: u8) {
        self.state.lock().unwrap().pans.push((coords, zoom));
    }
}

#[derive(Default)]
struct PresenterState {
    busy: bool,
    busy_changes: Vec<bool>,
    notices: Vec<Notice>,
    list: Vec<String>,
}

/// Presenter double keeping the list as ids, newest first.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    state: Arc<Mutex<PresenterState>>,
}

impl RecordingPresenter {
    pub fn is_busy(&self) -> bool {
        self.state.lock().unwrap().busy
    }

    pub fn busy_changes(&self) -> Vec<bool> {
        self.state.lock().unwrap().busy_changes.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.state.lock().unwrap().notices.clone()
    }

    pub fn list(&self) -> Vec<String> {
        self.state.lock().unwrap().list.clone()
    }
}

impl Presenter for RecordingPresenter {
    fn set_busy(&mut self, busy: bool) {
        let mut state = self.state.lock().unwrap();
        state.busy = busy;
        state.busy_changes.push(busy);
    }

    fn notify(&mut self, notice: &Notice) {
        self.state.lock().unwrap().notices.push(notice.clone());
    }

    fn show_list(&mut self, locations: &[Location]) {
        self.state.lock().unwrap().list =
            locations.iter().map(|l| l.id().to_string()).collect();
    }

    fn location_added(&mut self, location: &Location) {
        self.state
            .lock()
            .unwrap()
            .list
            .insert(0, location.id().to_string());
    }

    fn location_removed(&mut self, id: &str) {
        self.state.lock().unwrap().list.retain(|listed| listed != id);
    }
}

/// Geocoder answering every lookup the same way
pub struct FixedGeocoder {
    reply: std::result::Result<Place, String>,
}

impl FixedGeocoder {
    pub fn found(country: &str, description: &str) -> Self {
        Self {
            reply: Ok(Place {
                country: country.to_string(),
                description: description.to_string(),
            }),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn reverse_geocode(&self, _coords: Coords) -> Result<Place> {
        self.reply.clone().map_err(|message| PinError::Geocode { message })
    }
}

/// Storage where every read and write fails
pub struct FailingBlobStore;

impl BlobStore for FailingBlobStore {
    fn save(&self, _key: &str, _blob: &str) -> Result<()> {
        Err(PinError::Io(std::io::Error::other("disk full")))
    }

    fn load(&self, _key: &str) -> Result<Option<String>> {
        Err(PinError::Io(std::io::Error::other("disk unreadable")))
    }
}
