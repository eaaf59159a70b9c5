//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::{load_config, ConfigError};
use crate::config::source::SharedConfig;
use crate::observability::metrics;

/// A watcher that monitors the configuration file and swaps new snapshots
/// into a [`SharedConfig`].
pub struct ConfigWatcher {
    path: PathBuf,
    target: Arc<SharedConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher feeding `target`.
    pub fn new(path: &Path, target: Arc<SharedConfig>) -> Self {
        Self {
            path: path.to_path_buf(),
            target,
        }
    }

    /// Reload the file once. Invalid configurations leave the current one in place.
    pub fn reload(&self) -> Result<(), ConfigError> {
        reload_into(&self.path, &self.target)
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, ConfigError> {
        let target = Arc::clone(&self.target);
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        // Failures are already logged by reload_into.
                        let _ = reload_into(&path, &target);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload_into(path: &Path, target: &SharedConfig) -> Result<(), ConfigError> {
    match load_config(path) {
        Ok(config) => {
            target.store(config);
            tracing::info!(path = ?path, "Configuration reloaded");
            Ok(())
        }
        Err(e) => {
            metrics::record_config_reload("rejected");
            tracing::error!(
                "Failed to reload config: {}. Keeping current configuration.",
                e
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;
    use std::fs;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "migration-resilience-watcher-{}-{}.toml",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn test_reload_applies_valid_file() {
        let path = temp_path("valid");
        fs::write(&path, "[timeouts]\nrequest_secs = 9\n").unwrap();

        let shared = Arc::new(SharedConfig::default());
        ConfigWatcher::new(&path, Arc::clone(&shared)).reload().unwrap();
        assert_eq!(shared.current().timeouts.request_secs, 9);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_reload_keeps_current_on_invalid_file() {
        let path = temp_path("invalid");
        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        let shared = Arc::new(SharedConfig::default());
        let result = ConfigWatcher::new(&path, Arc::clone(&shared)).reload();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(shared.current().timeouts.request_secs, 100);

        fs::remove_file(&path).unwrap();
    }
}
