use console::style;
use log::{debug, info};

use crate::{Coords, Location, MapProvider, MarkerHandle, Notice, Presenter, Result};

/// Stand-in map for the terminal: markers are logged, panning is printed.
#[derive(Debug, Default)]
pub struct ConsoleMap {
    next_handle: u64,
}

impl MapProvider for ConsoleMap {
    fn is_ready(&self) -> bool {
        true
    }

    fn render_marker(&mut self, coords: Coords, content: &str) -> Result<MarkerHandle> {
        self.next_handle += 1;
        debug!("Marker #{} at {}: 🔰{}", self.next_handle, coords, content);
        Ok(MarkerHandle(self.next_handle))
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        debug!("Marker #{} removed", handle.0);
    }

    fn pan_to(&mut self, coords: Coords, zoom: u8) {
        println!("Map centered on {} (zoom {})", coords, zoom);
    }
}

/// Prints list changes to stdout and notices to stderr.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn set_busy(&mut self, busy: bool) {
        if busy {
            eprintln!("{}", style("Looking up location...").dim());
        }
    }

    fn notify(&mut self, notice: &Notice) {
        eprintln!("{}", style(notice).yellow());
    }

    fn show_list(&mut self, locations: &[Location]) {
        info!("{} stored locations", locations.len());
    }

    fn location_added(&mut self, location: &Location) {
        println!(
            "Added {} {}",
            style(location.id()).bold(),
            style(location.display_label()).cyan()
        );
        if !location.description().is_empty() {
            println!("  Location details: {}.", location.description());
        }
    }

    fn location_removed(&mut self, id: &str) {
        println!("Deleted {}", style(id).bold());
    }
}
