//! Extension entry point.
//!
//! [`CustomSave::load`] is what a host calls when the extension is enabled:
//! it loads settings, snapshots the action catalog, binds the save command
//! to `Mod+S` and takes that hotkey away from the host's default save.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::adapters::builtin::DEFAULT_SAVE_ACTION_ID;
use crate::adapters::{
    ActionRegistry, CommandRegistration, Editor, Hotkey, Modifier, ViewContext, Workspace,
};
use crate::core::{
    ActionCatalog, SaveOrchestrator, SettingsPanel, SettingsPersistence, SettingsStore,
    SAVE_COMMAND_ID,
};
use crate::domain::{SaveRun, Settings};

/// Display name of the save command
pub const SAVE_COMMAND_NAME: &str = "Save file";

/// A loaded instance of the extension
pub struct CustomSave {
    settings: Arc<SettingsStore>,
    catalog: Arc<ActionCatalog>,
    orchestrator: SaveOrchestrator,
}

impl CustomSave {
    /// Load the extension against a host
    pub async fn load(
        registry: Arc<dyn ActionRegistry>,
        workspace: Arc<dyn Workspace>,
        persistence: Arc<dyn SettingsPersistence>,
        markdown_extension: &str,
    ) -> Result<Self> {
        let settings = Arc::new(SettingsStore::new(persistence));
        if let Err(e) = settings.load().await {
            warn!(error = %e, "Could not load settings; using in-memory settings for this session");
        }

        let catalog = Arc::new(ActionCatalog::capture(registry.as_ref(), workspace.as_ref()).await);

        registry
            .register_command(CommandRegistration {
                id: SAVE_COMMAND_ID.to_string(),
                name: SAVE_COMMAND_NAME.to_string(),
                hotkeys: vec![Hotkey::new(vec![Modifier::Mod], "s")],
            })
            .context("Failed to register save command")?;

        registry
            .remove_default_hotkeys(DEFAULT_SAVE_ACTION_ID)
            .context("Failed to remove default save hotkey")?;

        let orchestrator = SaveOrchestrator::new(registry, workspace, settings.clone())
            .with_markdown_extension(markdown_extension);

        info!(
            actions = catalog.len(),
            configured = settings.get().command_ids.len(),
            "custom-save loaded"
        );

        Ok(Self {
            settings,
            catalog,
            orchestrator,
        })
    }

    /// Hotkey entry point, in the host's checked-callback shape
    pub async fn on_save(&self, checking: bool, editor: &mut dyn Editor, ctx: &ViewContext) -> bool {
        self.orchestrator
            .editor_check_callback(checking, editor, ctx)
            .await
    }

    /// Run the save sequence and return its record
    pub async fn save(&self, editor: &mut dyn Editor, ctx: &ViewContext) -> Option<SaveRun> {
        self.orchestrator.run(editor, ctx).await
    }

    /// A fresh settings panel bound to this instance
    pub fn settings_panel(&self) -> SettingsPanel {
        SettingsPanel::new(self.settings.clone(), self.catalog.clone())
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.get()
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn orchestrator(&self) -> &SaveOrchestrator {
        &self.orchestrator
    }
}
