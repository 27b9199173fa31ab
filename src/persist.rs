//! Whole-document snapshot persistence.
//!
//! The response cache and the usage stats each persist as one JSON document
//! that is loaded wholesale at startup and rewritten wholesale on mutation.
//! [`SnapshotStore`] abstracts where that document lives.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::Result;

/// Backend that stores a single serialized document.
pub trait SnapshotStore: Send + Sync {
    /// Read the document. `Ok(None)` means nothing has been written yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the document.
    fn save(&self, contents: &str) -> Result<()>;
}

/// JSON file on disk. Parent directories are created on first save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write to a sibling temp file first so a crash mid-write leaves the
        // previous snapshot intact.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing document.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            saves: Mutex::new(0),
        }
    }

    /// Current document, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents.to_string());
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

/// Load and parse a snapshot, falling back to `T::default()` on any failure.
///
/// A missing document is a normal cold start; a corrupt or unreadable one is
/// logged and discarded.
pub(crate) fn load_or_default<T>(store: &dyn SnapshotStore, what: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match store.load() {
        Ok(Some(data)) => match serde_json::from_str(&data) {
            Ok(value) => value,
            Err(e) => {
                warn!("{} snapshot is corrupt, starting empty: {}", what, e);
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Failed to read {} snapshot, starting empty: {}", what, e);
            T::default()
        }
    }
}

/// Serialize and save a snapshot (best-effort; failures are logged).
pub(crate) fn persist<T: serde::Serialize>(store: &dyn SnapshotStore, what: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = store.save(&json) {
                warn!("Failed to save {} snapshot: {}", what, e);
            }
        }
        Err(e) => warn!("Failed to serialize {} snapshot: {}", what, e),
    }
}
