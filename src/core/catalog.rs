//! Startup snapshot of the host's action catalog.
//!
//! Some host actions only expose their editor handlers while an editor is
//! open, so the snapshot is read through a transient markdown view that is
//! detached again on every exit path.

use tracing::{debug, info, warn};

use crate::adapters::{ActionRegistry, ViewHandle, ViewMode, Workspace};
use crate::domain::ActionDescriptor;
use crate::error::{CustomSaveError, CustomSaveResult};

/// A workspace view that is detached when dropped
pub struct TransientView<'a> {
    workspace: &'a dyn Workspace,
    handle: Option<ViewHandle>,
}

impl<'a> TransientView<'a> {
    /// Open a view in `mode`; it lives until `release` or drop
    pub async fn open(workspace: &'a dyn Workspace, mode: ViewMode) -> anyhow::Result<Self> {
        let handle = workspace.open_view(mode).await?;
        debug!(?handle, "Opened transient view");
        Ok(Self {
            workspace,
            handle: Some(handle),
        })
    }

    /// Detach now and report whether the host closed the view cleanly
    pub fn release(mut self) -> anyhow::Result<()> {
        match self.handle.take() {
            Some(handle) => self.workspace.detach_view(handle),
            None => Ok(()),
        }
    }
}

impl Drop for TransientView<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.workspace.detach_view(handle) {
                warn!(?handle, error = %e, "Failed to detach transient view");
            }
        }
    }
}

/// In-memory catalog of every action known at startup
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<ActionDescriptor>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<ActionDescriptor>) -> Self {
        Self { actions }
    }

    /// Capture the catalog, degrading to an empty one on failure
    pub async fn capture(registry: &dyn ActionRegistry, workspace: &dyn Workspace) -> Self {
        match Self::try_capture(registry, workspace).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Action catalog unavailable; no actions can be added until restart");
                Self::default()
            }
        }
    }

    /// Capture the catalog through a transient markdown view
    pub async fn try_capture(
        registry: &dyn ActionRegistry,
        workspace: &dyn Workspace,
    ) -> CustomSaveResult<Self> {
        let view = TransientView::open(workspace, ViewMode::Markdown)
            .await
            .map_err(|e| CustomSaveError::CatalogCapture(format!("{:#}", e)))?;

        let listed = registry.list_actions();
        let released = view.release();

        let actions = listed.map_err(|e| CustomSaveError::CatalogCapture(format!("{:#}", e)))?;
        released.map_err(|e| CustomSaveError::CatalogCapture(format!("{:#}", e)))?;

        let actions: Vec<ActionDescriptor> = actions.iter().map(ActionDescriptor::from).collect();
        info!(actions = actions.len(), "Captured action catalog");

        Ok(Self { actions })
    }

    /// Get an action by id
    pub fn get(&self, id: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// All actions in host order
    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter()
    }

    /// Actions that can run against an editor
    pub fn editor_actions(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter().filter(|a| a.is_editor_action())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HandlerKind;

    fn sample() -> ActionCatalog {
        ActionCatalog::new(vec![
            ActionDescriptor::new("editor:trim", "Trim", HandlerKind::CheckedEditor),
            ActionDescriptor::new("editor:newline", "Newline", HandlerKind::Editor),
            ActionDescriptor::new("app:settings", "Settings", HandlerKind::None),
        ])
    }

    #[test]
    fn test_catalog_get() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("editor:newline").map(|a| a.name.as_str()), Some("Newline"));
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_editor_actions_filter() {
        let ids: Vec<_> = sample().editor_actions().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["editor:trim", "editor:newline"]);
    }
}
