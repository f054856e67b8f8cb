//! CLI module for the pinmark application
//!
//! This module handles the command-line interface and the console stand-ins
//! for the map and the location list.
mod app;
mod args;
mod console;

pub use app::*;
pub use args::*;
pub use console::*;
