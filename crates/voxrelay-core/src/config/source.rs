//! Configuration snapshots.
//!
//! The server never caches credentials: every request and health check asks a
//! [`ConfigSource`] for a fresh [`Config`], so a key added to the environment
//! or config file takes effect on the next request.

use std::path::PathBuf;

use super::loader::load_config;
use super::schema::Config;

/// Produces the configuration in effect right now.
pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> Config;
}

/// Re-reads the config file and process environment on every snapshot.
#[derive(Clone, Debug, Default)]
pub struct EnvConfigSource {
    path: Option<PathBuf>,
}

impl EnvConfigSource {
    /// Read from a specific config file instead of `~/.voxrelay/config.json`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl ConfigSource for EnvConfigSource {
    fn snapshot(&self) -> Config {
        load_config(self.path.as_deref())
    }
}

/// A fixed configuration, handed out unchanged.
#[derive(Clone, Debug, Default)]
pub struct StaticConfig(pub Config);

impl ConfigSource for StaticConfig {
    fn snapshot(&self) -> Config {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_config_returns_same_snapshot() {
        let mut config = Config::default();
        config.server.port = 4321;
        let source = StaticConfig(config.clone());
        assert_eq!(source.snapshot(), config);
        assert_eq!(source.snapshot(), source.snapshot());
    }

    #[test]
    fn env_source_picks_up_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let source = EnvConfigSource::with_path(&path);

        std::fs::write(&path, r#"{ "local": { "nPredict": 64 } }"#).unwrap();
        assert_eq!(source.snapshot().local.n_predict, 64);

        std::fs::write(&path, r#"{ "local": { "nPredict": 32 } }"#).unwrap();
        assert_eq!(source.snapshot().local.n_predict, 32);
    }
}
