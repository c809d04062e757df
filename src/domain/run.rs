//! Record of a single orchestrated save.
//!
//! A SaveRun is built up while the orchestrator works through the
//! configured actions and handed back to the caller when it finishes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One execution of the save sequence
#[derive(Debug, Clone, Serialize)]
pub struct SaveRun {
    /// Unique identifier for this run
    pub id: Uuid,

    /// File the run was triggered for
    pub file: PathBuf,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (set once the closing save returns)
    pub completed_at: Option<DateTime<Utc>>,

    /// Bracketing saves, in the order they were attempted
    pub saves: Vec<SaveOutcome>,

    /// Configured actions, in the order they were attempted
    pub steps: Vec<StepRecord>,
}

impl SaveRun {
    pub fn new(file: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            started_at: Utc::now(),
            completed_at: None,
            saves: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Mark the run as finished
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Number of steps that ended with the given status
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Number of handler invocations that returned successfully
    pub fn invoked(&self) -> usize {
        self.count(StepStatus::Completed)
    }

    /// True if every step and both saves went through cleanly
    pub fn is_clean(&self) -> bool {
        self.saves.iter().all(|s| s.error.is_none())
            && self
                .steps
                .iter()
                .all(|s| matches!(s.status, StepStatus::Completed | StepStatus::Skipped))
    }
}

/// Which of the two bracketing saves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    Before,
    After,
}

/// Result of one bracketing save
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub phase: SavePhase,

    /// False when the workspace had no savable view, so nothing was called
    pub attempted: bool,

    /// Error message if the save itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status of a configured step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Handler ran and returned Ok
    Completed,

    /// Id did not resolve in the registry
    NotFound,

    /// Handler returned an error or panicked
    Failed,

    /// Action resolved but has no editor handler
    Skipped,
}

/// Outcome of one configured step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub action_id: String,
    pub status: StepStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Time spent in the handler
    pub duration_ms: u64,
}

impl StepRecord {
    pub fn new(action_id: impl Into<String>, status: StepStatus) -> Self {
        Self {
            action_id: action_id.into(),
            status,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}
