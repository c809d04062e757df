//! Error taxonomy for the save hook.
//!
//! Only `Persistence` ever reaches a caller as a hard failure. The other
//! variants are recovered locally and recorded on the run or logged.

use thiserror::Error;

/// Errors raised while capturing, configuring or running the save hook
#[derive(Debug, Error)]
pub enum CustomSaveError {
    /// A configured id has no registry entry at run time
    #[error("custom save: command {0} not found")]
    ActionNotFound(String),

    /// A resolved action's handler returned an error or panicked
    #[error("custom save: command {id} failed: {message}")]
    HandlerInvocation { id: String, message: String },

    /// The startup catalog snapshot could not be read
    #[error("failed to capture action catalog: {0}")]
    CatalogCapture(String),

    /// Settings could not be loaded or saved
    #[error("settings persistence failed: {0}")]
    Persistence(String),
}

/// Result alias for the crate taxonomy
pub type CustomSaveResult<T> = Result<T, CustomSaveError>;

impl From<serde_json::Error> for CustomSaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
