//! Configuration system — schema, loading, env var overrides, and snapshots.
//!
//! # Usage
//! ```no_run
//! use voxrelay_core::config::{ConfigSource, EnvConfigSource};
//!
//! let source = EnvConfigSource::default();
//! let cfg = source.snapshot();
//! println!("Port: {}", cfg.server.port);
//! ```

pub mod loader;
pub mod schema;
pub mod source;

// Re-export key types
pub use loader::{apply_env_overrides, get_config_path, load_config, save_config};
pub use schema::Config;
pub use source::{ConfigSource, EnvConfigSource, StaticConfig};
