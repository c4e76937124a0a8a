//! Configuration loading and application.
//!
//! Values come from three layers: explicit CLI flags (or their environment
//! variables), then the config file, then built-in defaults.
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::{ExporterSettings, apply_config, resolve_settings};
pub use loader::load_config;

#[cfg(test)]
pub(crate) use loader::load_config_file;
pub(crate) use parse::parse_duration_value;
