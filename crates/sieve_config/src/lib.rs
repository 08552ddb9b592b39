//! Parsing and validation of `sieve.toml` configuration files.
//!
//! The configuration file is optional. When present it supplies defaults for
//! the cache location, extra library imports, the output separator, and the
//! fan-out worker pool; command-line flags override every value.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, locate_config, CONFIG_ENV};
pub use resolve::{default_cache_dir, default_cache_dir_with, resolve_cache_dir, CACHE_DIR_ENV};
pub use types::*;
