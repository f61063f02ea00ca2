//! modemwatch-core — configuration shared by the watchdog crates.

pub mod config;
pub mod error;

pub use config::{FileConfig, Overrides, Settings};
pub use error::{ConfigError, ConfigResult};
