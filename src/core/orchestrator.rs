//! Save orchestrator.
//!
//! Runs the bracketing saves and the configured action sequence. Every
//! step is isolated: a missing action, a handler error or a handler panic
//! is logged and recorded, and the sequence carries on to the next id and
//! the closing save.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{ActionHandler, ActionRegistry, Editor, ViewContext, Workspace};
use crate::domain::{SaveOutcome, SavePhase, SaveRun, StepRecord, StepStatus};
use crate::error::CustomSaveError;

use super::settings_store::SettingsStore;

/// Extension of files the hook applies to unless configured otherwise
pub const MARKDOWN_EXTENSION: &str = "md";

/// Replacement for the host's default save action
pub struct SaveOrchestrator {
    registry: Arc<dyn ActionRegistry>,
    workspace: Arc<dyn Workspace>,
    settings: Arc<SettingsStore>,
    markdown_extension: String,
}

impl SaveOrchestrator {
    pub fn new(
        registry: Arc<dyn ActionRegistry>,
        workspace: Arc<dyn Workspace>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            registry,
            workspace,
            settings,
            markdown_extension: MARKDOWN_EXTENSION.to_string(),
        }
    }

    /// Apply the hook to files with a different extension
    pub fn with_markdown_extension(mut self, extension: impl Into<String>) -> Self {
        self.markdown_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn markdown_extension(&self) -> &str {
        &self.markdown_extension
    }

    /// True iff the context has a file with the markdown extension
    pub fn check(&self, ctx: &ViewContext) -> bool {
        ctx.file
            .as_ref()
            .and_then(|f| f.extension())
            .is_some_and(|ext| ext == self.markdown_extension)
    }

    /// Combined entry point in the host's checked-callback shape.
    ///
    /// With `checking` set this only reports applicability. Otherwise it
    /// runs the save sequence and returns whether anything ran.
    pub async fn editor_check_callback(
        &self,
        checking: bool,
        editor: &mut dyn Editor,
        ctx: &ViewContext,
    ) -> bool {
        if ctx.file.is_none() {
            return false;
        }
        if checking {
            return self.check(ctx);
        }
        self.run(editor, ctx).await.is_some()
    }

    /// Save, run every configured action in order, save again.
    ///
    /// Returns `None` without doing anything when no file is open.
    #[instrument(skip_all, fields(file = tracing::field::Empty))]
    pub async fn run(&self, editor: &mut dyn Editor, ctx: &ViewContext) -> Option<SaveRun> {
        let file = ctx.file.as_ref()?;
        tracing::Span::current().record("file", tracing::field::display(file.path().display()));

        let mut run = SaveRun::new(file.path().to_path_buf());

        run.saves.push(self.save_active_view(SavePhase::Before).await);

        let settings = self.settings.get();
        for action_id in &settings.command_ids {
            let record = self.run_step(action_id, editor, ctx);
            run.steps.push(record);
        }

        run.saves.push(self.save_active_view(SavePhase::After).await);
        run.complete();

        info!(
            run_id = %run.id,
            steps = run.steps.len(),
            invoked = run.invoked(),
            failed = run.count(StepStatus::Failed),
            not_found = run.count(StepStatus::NotFound),
            "Save sequence finished"
        );

        Some(run)
    }

    /// Resolve and invoke one configured action
    fn run_step(&self, action_id: &str, editor: &mut dyn Editor, ctx: &ViewContext) -> StepRecord {
        let Some(action) = self.registry.find_action(action_id) else {
            let err = CustomSaveError::ActionNotFound(action_id.to_string());
            error!(action_id, "{}", err);
            return StepRecord::new(action_id, StepStatus::NotFound).with_error(err.to_string());
        };

        let started = Instant::now();
        let result = match &action.handler {
            ActionHandler::CheckedEditor(callback) => {
                invoke_isolated(|| callback(false, &mut *editor, ctx).map(|_| ()))
            }
            ActionHandler::Editor(callback) => invoke_isolated(|| callback(&mut *editor, ctx)),
            ActionHandler::None => {
                debug!(action_id, "Action has no editor handler, skipping");
                return StepRecord::new(action_id, StepStatus::Skipped);
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                debug!(action_id, duration_ms, "Action completed");
                StepRecord::new(action_id, StepStatus::Completed).with_duration(duration_ms)
            }
            Err(message) => {
                let err = CustomSaveError::HandlerInvocation {
                    id: action_id.to_string(),
                    message,
                };
                error!(action_id, duration_ms, "{}", err);
                StepRecord::new(action_id, StepStatus::Failed)
                    .with_duration(duration_ms)
                    .with_error(err.to_string())
            }
        }
    }

    /// Best-effort save of the active file view
    async fn save_active_view(&self, phase: SavePhase) -> SaveOutcome {
        let Some(view) = self.workspace.active_file_view() else {
            debug!(?phase, "No active file view to save");
            return SaveOutcome {
                phase,
                attempted: false,
                error: None,
            };
        };

        let error = match view.save().await {
            Ok(()) => None,
            Err(e) => {
                warn!(?phase, error = %e, "Saving the active view failed");
                Some(format!("{:#}", e))
            }
        };

        SaveOutcome {
            phase,
            attempted: true,
            error,
        }
    }
}

/// Run a handler, turning both errors and panics into a message
fn invoke_isolated<F>(f: F) -> Result<(), String>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(payload) => Err(format!("handler panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
