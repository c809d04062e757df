//! Settings store with persist-then-publish updates.
//!
//! The store is the only writer of [`Settings`]. Readers get an
//! `Arc<Settings>` snapshot; an update computes the next value, hands it to
//! the persistence backend, and only swaps it in once the write succeeded.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, task};
use tracing::{debug, warn};

use crate::domain::Settings;
use crate::error::{CustomSaveError, CustomSaveResult};

/// Suffix of the copy kept when unreadable settings are overwritten
const BACKUP_SUFFIX: &str = ".bak";

/// Host-provided load/save of the raw settings blob
#[async_trait]
pub trait SettingsPersistence: Send + Sync {
    /// Previously saved data, or `None` on first run
    async fn load_data(&self) -> Result<Option<Value>>;

    async fn save_data(&self, data: &Value) -> Result<()>;

    /// Keep a copy of persisted data that failed to load, before it is
    /// overwritten. Returns where the copy went, if anywhere.
    async fn backup_unreadable(&self) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Settings persisted as a pretty-printed JSON file
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsPersistence for JsonFilePersistence {
    async fn load_data(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings JSON: {}", self.path.display()))?;
        Ok(Some(value))
    }

    async fn save_data(&self, data: &Value) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .await
            .with_context(|| format!("Failed to create settings directory: {}", parent.display()))?;

        let content = serde_json::to_string_pretty(data)?;
        let path = self.path.clone();

        // Write next to the target and rename so readers never see half a file
        task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)
                .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
            tmp.write_all(content.as_bytes())
                .context("Failed to write settings")?;
            tmp.persist(&path)
                .with_context(|| format!("Failed to write settings: {}", path.display()))?;
            Ok(())
        })
        .await
        .context("Settings writer task failed")??;

        Ok(())
    }

    async fn backup_unreadable(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut backup = self.path.clone().into_os_string();
        backup.push(BACKUP_SUFFIX);
        let backup = PathBuf::from(backup);

        fs::copy(&self.path, &backup)
            .await
            .with_context(|| format!("Failed to back up settings to {}", backup.display()))?;
        Ok(Some(backup))
    }
}

/// In-memory persistence, used when no file is configured and in tests
#[derive(Default)]
pub struct MemoryPersistence {
    data: Mutex<Option<Value>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }

    /// Last saved blob
    pub fn snapshot(&self) -> Option<Value> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl SettingsPersistence for MemoryPersistence {
    async fn load_data(&self) -> Result<Option<Value>> {
        Ok(self.snapshot())
    }

    async fn save_data(&self, data: &Value) -> Result<()> {
        *self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(data.clone());
        Ok(())
    }
}

/// Owner of the canonical in-memory settings
pub struct SettingsStore {
    persistence: Arc<dyn SettingsPersistence>,
    current: RwLock<Arc<Settings>>,
    /// Serializes read-modify-persist-publish cycles
    update_lock: tokio::sync::Mutex<()>,
    /// Set while persisted data exists that the last `load` could not read
    unreadable: AtomicBool,
}

impl SettingsStore {
    /// Create a store holding default settings until `load` is called
    pub fn new(persistence: Arc<dyn SettingsPersistence>) -> Self {
        Self {
            persistence,
            current: RwLock::new(Arc::new(Settings::default())),
            update_lock: tokio::sync::Mutex::new(()),
            unreadable: AtomicBool::new(false),
        }
    }

    /// Populate settings from persisted state.
    ///
    /// On failure the store keeps its defaults so the hook stays usable
    /// with in-memory settings for the session. The first update after
    /// that backs up the unreadable data before overwriting it.
    pub async fn load(&self) -> CustomSaveResult<Arc<Settings>> {
        let _guard = self.update_lock.lock().await;

        let mut settings = match self.read_persisted().await {
            Ok(settings) => settings,
            Err(e) => {
                self.unreadable.store(true, Ordering::SeqCst);
                return Err(e);
            }
        };
        self.unreadable.store(false, Ordering::SeqCst);

        let removed = settings.dedup();
        if !removed.is_empty() {
            warn!(?removed, "Dropped duplicate command ids from persisted settings");
        }

        debug!(commands = settings.command_ids.len(), "Settings loaded");
        let settings = Arc::new(settings);
        self.publish(settings.clone());
        Ok(settings)
    }

    async fn read_persisted(&self) -> CustomSaveResult<Settings> {
        let data = self
            .persistence
            .load_data()
            .await
            .map_err(|e| CustomSaveError::Persistence(format!("{:#}", e)))?;

        match data {
            Some(value) => Ok(serde_json::from_value::<Settings>(value)?),
            None => Ok(Settings::default()),
        }
    }

    /// Current settings snapshot
    pub fn get(&self) -> Arc<Settings> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace settings with `f(current)`.
    ///
    /// The new value is visible to `get` only after it was persisted.
    pub async fn update<F>(&self, f: F) -> CustomSaveResult<Arc<Settings>>
    where
        F: FnOnce(&Settings) -> Settings,
    {
        let _guard = self.update_lock.lock().await;

        let current = self.get();
        let next = f(&current);
        if next == *current {
            return Ok(current);
        }

        if self.unreadable.load(Ordering::SeqCst) {
            self.preserve_unreadable().await?;
        }

        let data = serde_json::to_value(&next)?;
        self.persistence
            .save_data(&data)
            .await
            .map_err(|e| CustomSaveError::Persistence(format!("{:#}", e)))?;
        self.unreadable.store(false, Ordering::SeqCst);

        let next = Arc::new(next);
        self.publish(next.clone());
        Ok(next)
    }

    /// Back up settings that failed to load before the first overwrite
    async fn preserve_unreadable(&self) -> CustomSaveResult<()> {
        let backup = self
            .persistence
            .backup_unreadable()
            .await
            .map_err(|e| CustomSaveError::Persistence(format!("{:#}", e)))?;

        match backup {
            Some(path) => warn!(
                backup = %path.display(),
                "Overwriting settings that could not be loaded; previous contents kept"
            ),
            None => warn!("Overwriting settings that could not be loaded"),
        }
        Ok(())
    }

    fn publish(&self, settings: Arc<Settings>) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }
}
