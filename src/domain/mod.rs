//! Domain types for the save hook.
//!
//! This module contains the core data structures:
//! - ActionDescriptor: catalog entries captured at startup
//! - Settings: the user's ordered list of action ids
//! - SaveRun: record of one orchestrated save

pub mod action;
pub mod run;
pub mod settings;

// Re-export commonly used types
pub use action::{ActionDescriptor, HandlerKind};
pub use run::{SaveOutcome, SavePhase, SaveRun, StepRecord, StepStatus};
pub use settings::Settings;
