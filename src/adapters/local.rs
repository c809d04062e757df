//! Local file-system host.
//!
//! Implements the host traits over markdown files on disk so the hook can
//! run outside a GUI application. Opening a file creates a markdown view
//! backed by an in-memory document; saving the view writes it back.
//!
//! Like a real editor host, editor-scoped actions only report their
//! handlers while at least one markdown view is open.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::builtin::builtin_actions;
use super::external::ExternalFilter;
use super::{
    ActionHandler, ActionRegistry, CommandRegistration, Editor, FileRef, FileView,
    RegisteredAction, ViewContext, ViewHandle, ViewMode, Workspace,
};

/// Text of an open file
#[derive(Debug)]
struct Document {
    file: FileRef,
    text: String,
}

type SharedDocument = Arc<Mutex<Document>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct View {
    mode: ViewMode,
    document: Option<SharedDocument>,
}

#[derive(Debug, Default)]
struct HostState {
    actions: Vec<RegisteredAction>,
    views: HashMap<ViewHandle, View>,
    active: Option<ViewHandle>,
    next_handle: u64,
    commands: Vec<CommandRegistration>,
    removed_default_hotkeys: HashSet<String>,
}

impl HostState {
    fn allocate_handle(&mut self) -> ViewHandle {
        self.next_handle += 1;
        ViewHandle(self.next_handle)
    }

    fn editor_active(&self) -> bool {
        self.views.values().any(|v| v.mode == ViewMode::Markdown)
    }

    /// Report an action the way the host would right now
    fn visible(&self, action: &RegisteredAction) -> RegisteredAction {
        if self.editor_active() {
            action.clone()
        } else {
            RegisteredAction::new(action.id.clone(), action.name.clone(), ActionHandler::None)
        }
    }
}

/// Host over the local file system
#[derive(Debug)]
pub struct LocalHost {
    state: Mutex<HostState>,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHost {
    /// Create a host with the built-in actions registered
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                actions: builtin_actions(),
                ..Default::default()
            }),
        }
    }

    /// Create a host with built-ins plus the given external filters
    pub fn with_filters(filters: &[ExternalFilter]) -> Self {
        let host = Self::new();
        for filter in filters {
            host.register_action(filter.to_action());
        }
        host
    }

    /// Add or replace an action in the registry
    pub fn register_action(&self, action: RegisteredAction) {
        let mut state = lock(&self.state);
        if let Some(existing) = state.actions.iter_mut().find(|a| a.id == action.id) {
            *existing = action;
        } else {
            state.actions.push(action);
        }
    }

    /// Open `path` in a new markdown view and make it active
    pub async fn open_file(&self, path: &Path) -> Result<ViewHandle> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let document = Arc::new(Mutex::new(Document {
            file: FileRef::new(path),
            text,
        }));

        let mut state = lock(&self.state);
        let handle = state.allocate_handle();
        state.views.insert(
            handle,
            View {
                mode: ViewMode::Markdown,
                document: Some(document),
            },
        );
        state.active = Some(handle);
        debug!(?handle, path = %path.display(), "Opened file view");

        Ok(handle)
    }

    /// Editor bound to the document shown in `handle`
    pub fn editor(&self, handle: ViewHandle) -> Option<DocumentEditor> {
        let state = lock(&self.state);
        let document = state.views.get(&handle)?.document.clone()?;
        Some(DocumentEditor { document })
    }

    /// View context (the backing file) for `handle`
    pub fn context(&self, handle: ViewHandle) -> ViewContext {
        let state = lock(&self.state);
        let file = state
            .views
            .get(&handle)
            .and_then(|v| v.document.as_ref())
            .map(|d| lock(d).file.clone());
        ViewContext { file }
    }

    /// Number of views currently open
    pub fn open_view_count(&self) -> usize {
        lock(&self.state).views.len()
    }

    /// Commands registered by extensions
    pub fn registered_commands(&self) -> Vec<CommandRegistration> {
        lock(&self.state).commands.clone()
    }

    /// True while the host still binds its default hotkeys for `action_id`
    pub fn has_default_hotkeys(&self, action_id: &str) -> bool {
        !lock(&self.state).removed_default_hotkeys.contains(action_id)
    }
}

impl ActionRegistry for LocalHost {
    fn list_actions(&self) -> Result<Vec<RegisteredAction>> {
        let state = lock(&self.state);
        Ok(state.actions.iter().map(|a| state.visible(a)).collect())
    }

    fn find_action(&self, id: &str) -> Option<RegisteredAction> {
        let state = lock(&self.state);
        state
            .actions
            .iter()
            .find(|a| a.id == id)
            .map(|a| state.visible(a))
    }

    fn register_command(&self, registration: CommandRegistration) -> Result<()> {
        let mut state = lock(&self.state);
        if state.commands.iter().any(|c| c.id == registration.id) {
            anyhow::bail!("Command '{}' is already registered", registration.id);
        }

        // Extension commands show up in the registry like any other action
        if !state.actions.iter().any(|a| a.id == registration.id) {
            state.actions.push(RegisteredAction::new(
                registration.id.clone(),
                registration.name.clone(),
                ActionHandler::None,
            ));
        }

        debug!(command = %registration.id, "Registered command");
        state.commands.push(registration);
        Ok(())
    }

    fn remove_default_hotkeys(&self, action_id: &str) -> Result<()> {
        lock(&self.state)
            .removed_default_hotkeys
            .insert(action_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl Workspace for LocalHost {
    async fn open_view(&self, mode: ViewMode) -> Result<ViewHandle> {
        let mut state = lock(&self.state);
        let handle = state.allocate_handle();
        state.views.insert(
            handle,
            View {
                mode,
                document: None,
            },
        );
        Ok(handle)
    }

    fn detach_view(&self, handle: ViewHandle) -> Result<()> {
        let mut state = lock(&self.state);
        if state.views.remove(&handle).is_none() {
            anyhow::bail!("View {:?} is not open", handle);
        }
        if state.active == Some(handle) {
            state.active = None;
        }
        Ok(())
    }

    fn active_file_view(&self) -> Option<Arc<dyn FileView>> {
        let state = lock(&self.state);
        let handle = state.active?;
        let document = state.views.get(&handle)?.document.clone()?;
        Some(Arc::new(LocalFileView { document }))
    }
}

/// File view that writes its document back to disk
pub struct LocalFileView {
    document: SharedDocument,
}

#[async_trait]
impl FileView for LocalFileView {
    fn file(&self) -> Option<FileRef> {
        Some(lock(&self.document).file.clone())
    }

    async fn save(&self) -> Result<()> {
        let (path, text) = {
            let doc = lock(&self.document);
            (doc.file.path.clone(), doc.text.clone())
        };

        fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }
}

/// Editor over a shared document
pub struct DocumentEditor {
    document: SharedDocument,
}

impl Editor for DocumentEditor {
    fn value(&self) -> String {
        lock(&self.document).text.clone()
    }

    fn set_value(&mut self, value: &str) {
        lock(&self.document).text = value.to_string();
    }
}
