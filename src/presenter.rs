//! Presentation hooks the engine drives: busy indicator, notices and the
//! location list.
use crate::{Location, Notice};

/// The user-facing side of the engine. Nothing here can fail.
pub trait Presenter: Send {
    /// Shows or hides the busy indicator while lookups are in flight.
    fn set_busy(&mut self, busy: bool);

    /// Shows a transient, non-blocking message.
    fn notify(&mut self, notice: &Notice);

    /// Redraws the whole list, newest first.
    fn show_list(&mut self, locations: &[Location]);

    /// Inserts a freshly created location at the top of the list.
    fn location_added(&mut self, location: &Location);

    fn location_removed(&mut self, id: &str);
}
