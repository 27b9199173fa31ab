//! File-mtime polling watcher that republishes the config on change.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Config, WatchedToggles};

/// Running watcher task started by [`ConfigWatcher::spawn`].
pub struct ConfigWatchHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ConfigWatchHandle {
    /// Signal the watcher and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Polling-based config watcher.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    last_mtime: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, poll_interval: Duration) -> Self {
        Self {
            path,
            poll_interval,
            last_mtime: None,
        }
    }

    pub fn default_path(poll_interval: Duration) -> Self {
        Self::new(Config::path(), poll_interval)
    }

    /// Start watching on the current runtime. `initial` is what the returned
    /// toggles report until the file first changes.
    pub fn spawn(self, initial: Config) -> (WatchedToggles, ConfigWatchHandle) {
        let (tx, rx) = watch::channel(initial);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.watch(tx, shutdown_rx));
        (
            WatchedToggles::new(rx),
            ConfigWatchHandle { shutdown_tx, task },
        )
    }

    /// Poll until shutdown, publishing each successfully reloaded config.
    ///
    /// A file that fails to parse or validate is ignored and the previously
    /// published config stays current.
    pub async fn watch(mut self, tx: watch::Sender<Config>, mut shutdown_rx: watch::Receiver<bool>) {
        self.last_mtime = read_mtime(&self.path);
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Config watcher shutting down");
                        return;
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if *shutdown_rx.borrow() {
                return;
            }

            let current = read_mtime(&self.path);
            let changed = match (self.last_mtime, current) {
                (Some(prev), Some(next)) => next != prev,
                (None, Some(_)) => true,
                _ => false,
            };
            if !changed {
                continue;
            }

            self.last_mtime = current;
            match Config::load_from_path(&self.path) {
                Ok(mut config) => {
                    config.apply_env_overrides();
                    debug!(path = %self.path.display(), "Config file changed, republishing");
                    if tx.send(config).is_err() {
                        warn!("All config receivers dropped, stopping watcher");
                        return;
                    }
                }
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "Config reload rejected; keeping running configuration"
                    );
                }
            }
        }
    }
}

fn read_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToggleSource;
    use tempfile::TempDir;

    #[tokio::test]
    async fn watcher_publishes_toggle_change() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("config.json");
        std::fs::write(&cfg_path, "{}").unwrap();

        let (tx, mut rx) = watch::channel(Config::default());
        let toggles = WatchedToggles::new(rx.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ConfigWatcher::new(cfg_path.clone(), Duration::from_millis(25));
        let handle = tokio::spawn(watcher.watch(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        std::fs::write(&cfg_path, r#"{"features":{"quote_explanations":false}}"#).unwrap();

        tokio::time::timeout(Duration::from_secs(3), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(!toggles.current().quote_explanations);
        assert!(toggles.current().journal_insights);

        let _ = shutdown_tx.send(true);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn watcher_keeps_config_on_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("config.json");

        let (tx, rx) = watch::channel(Config::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ConfigWatcher::new(cfg_path.clone(), Duration::from_millis(20));
        let handle = tokio::spawn(watcher.watch(tx, shutdown_rx));

        std::fs::write(&cfg_path, r#"{"rate_limit":{"max_per_hour":0}}"#).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(rx.borrow().rate_limit.max_per_hour, 20);

        let _ = shutdown_tx.send(true);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn spawned_watcher_stops_on_request() {
        let tmp = TempDir::new().unwrap();
        let cfg_path = tmp.path().join("config.json");
        let mut initial = Config::default();
        initial.features.weekly_patterns = false;

        let watcher = ConfigWatcher::new(cfg_path, Duration::from_millis(20));
        let (toggles, handle) = watcher.spawn(initial);
        assert!(!toggles.current().weekly_patterns);

        tokio::time::timeout(Duration::from_secs(2), handle.stop())
            .await
            .unwrap();
    }
}
