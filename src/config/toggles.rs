//! Feature toggle sources read on every coordinator call.

use std::sync::RwLock;

use tokio::sync::watch;

use super::{Config, FeatureToggles};

/// Supplies the current toggles. Implementations must return fresh values;
/// the coordinator never caches them.
pub trait ToggleSource: Send + Sync {
    fn current(&self) -> FeatureToggles;
}

/// Toggles held in memory and changed explicitly.
#[derive(Debug, Default)]
pub struct StaticToggles {
    toggles: RwLock<FeatureToggles>,
}

impl StaticToggles {
    pub fn new(toggles: FeatureToggles) -> Self {
        Self {
            toggles: RwLock::new(toggles),
        }
    }

    pub fn set(&self, toggles: FeatureToggles) {
        *self.toggles.write().unwrap_or_else(|e| e.into_inner()) = toggles;
    }

    pub fn update(&self, f: impl FnOnce(&mut FeatureToggles)) {
        f(&mut self.toggles.write().unwrap_or_else(|e| e.into_inner()));
    }
}

impl ToggleSource for StaticToggles {
    fn current(&self) -> FeatureToggles {
        self.toggles
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Toggles following the latest config published by a
/// [`super::ConfigWatcher`].
#[derive(Debug, Clone)]
pub struct WatchedToggles {
    rx: watch::Receiver<Config>,
}

impl WatchedToggles {
    pub fn new(rx: watch::Receiver<Config>) -> Self {
        Self { rx }
    }
}

impl ToggleSource for WatchedToggles {
    fn current(&self) -> FeatureToggles {
        self.rx.borrow().features.clone()
    }
}
