//! Configuration management for s7probe.
//!
//! Provides XDG-compliant storage for the settings file that supplies
//! connection and polling defaults to every command.

mod settings;

pub use settings::{AppSettings, Paths};
