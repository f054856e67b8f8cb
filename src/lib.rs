//! Location marking library
//!
//! This library keeps a set of marked map locations consistent across three
//! views: the in-memory list, the markers drawn on the map and durable
//! storage. Reverse geocoding runs concurrently with user interaction.

mod cli;
mod codec;
mod config;
mod engine;
mod errors;
mod geocode;
mod helper;
mod location;
mod markers;
mod presenter;
mod storage;
mod store;
mod types;

#[cfg(test)]
mod testing;

// Re-export key components
pub use cli::*;
pub use codec::{decode, encode};
pub use config::*;
pub use engine::*;
pub use errors::*;
pub use geocode::*;
pub use helper::*;
pub use location::*;
pub use markers::*;
pub use presenter::*;
pub use storage::*;
pub use store::*;
pub use types::*;
