//! Configuration options recognized by the gitsu resolution engine.

#![warn(clippy::all)]

mod error;
mod loader;
mod types;

pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, ConfigSource};
pub use types::Config;
