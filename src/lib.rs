//! custom-save - run editor actions around every save
//!
//! An editor extension that replaces the host's save hotkey. On save it
//! flushes the file, runs a user-configured sequence of registered actions
//! against the open document, and flushes again.
//!
//! # Architecture
//!
//! - The action catalog is captured once at load time through a transient
//!   markdown view, so editor-scoped actions report their handlers
//! - Settings are an ordered list of action ids, updated by pure
//!   transformations and persisted before they become visible
//! - Each configured action runs in isolation: a missing action, an error
//!   or a panic is recorded and the sequence moves on
//!
//! # Modules
//!
//! - `adapters`: Host interfaces and the local file-system host
//! - `core`: Catalog, SettingsStore, SettingsPanel, SaveOrchestrator
//! - `domain`: Data structures (ActionDescriptor, Settings, SaveRun)
//! - `plugin`: Extension entry point
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # See what can run on save
//! custom-save actions
//!
//! # Configure and run
//! custom-save add editor:trim-trailing-whitespace
//! custom-save save notes/today.md
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod plugin;

// Re-export main types at crate root for convenience
pub use adapters::{ActionHandler, ActionRegistry, Editor, LocalHost, ViewContext, Workspace};
pub use core::{ActionCatalog, SaveOrchestrator, SettingsPanel, SettingsStore};
pub use domain::{ActionDescriptor, HandlerKind, SaveRun, Settings, StepStatus};
pub use error::{CustomSaveError, CustomSaveResult};
pub use plugin::CustomSave;
