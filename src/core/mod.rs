//! Core save-hook logic.
//!
//! This module contains:
//! - Catalog: startup snapshot of host actions
//! - SettingsStore: persisted list of actions to run
//! - SettingsPanel: ordered-list editor over the store
//! - SaveOrchestrator: the save sequence itself

pub mod catalog;
pub mod orchestrator;
pub mod panel;
pub mod settings_store;

// Re-export commonly used types
pub use catalog::{ActionCatalog, TransientView};
pub use orchestrator::{SaveOrchestrator, MARKDOWN_EXTENSION};
pub use panel::{DropdownOption, EntryRow, PanelView, SettingsPanel, SAVE_COMMAND_ID};
pub use settings_store::{
    JsonFilePersistence, MemoryPersistence, SettingsPersistence, SettingsStore,
};
