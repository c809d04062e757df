//! Host interfaces and the reference host implementation.
//!
//! The save hook never owns the host application. Everything it needs
//! (the action registry, document views, the editor buffer) is reached
//! through the traits defined here, so a real host and the local file
//! system host in [`local`] plug in the same way.

pub mod builtin;
pub mod external;
pub mod local;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the reference host
pub use external::ExternalFilter;
pub use local::LocalHost;

/// Editor callback: runs unconditionally against the active editor
pub type EditorCallback = Arc<dyn Fn(&mut dyn Editor, &ViewContext) -> Result<()> + Send + Sync>;

/// Checked editor callback: `checking = true` asks for applicability only,
/// `checking = false` performs the action
pub type EditorCheckCallback =
    Arc<dyn Fn(bool, &mut dyn Editor, &ViewContext) -> Result<bool> + Send + Sync>;

/// A file backing a document view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

/// Context passed alongside the editor to every handler
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    /// File open in the view, if any
    pub file: Option<FileRef>,
}

impl ViewContext {
    pub fn for_file(file: FileRef) -> Self {
        Self { file: Some(file) }
    }
}

/// Mutable access to the text of the active document
pub trait Editor: Send {
    fn value(&self) -> String;

    fn set_value(&mut self, value: &str);
}

/// How an action can be invoked from an editor
#[derive(Clone, Default)]
pub enum ActionHandler {
    /// Not editor-scoped
    #[default]
    None,

    /// Unconditional editor handler
    Editor(EditorCallback),

    /// Handler that can also report applicability
    CheckedEditor(EditorCheckCallback),
}

impl ActionHandler {
    pub fn editor<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Editor, &ViewContext) -> Result<()> + Send + Sync + 'static,
    {
        Self::Editor(Arc::new(f))
    }

    pub fn checked<F>(f: F) -> Self
    where
        F: Fn(bool, &mut dyn Editor, &ViewContext) -> Result<bool> + Send + Sync + 'static,
    {
        Self::CheckedEditor(Arc::new(f))
    }
}

impl fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Editor(_) => f.write_str("Editor(..)"),
            Self::CheckedEditor(_) => f.write_str("CheckedEditor(..)"),
        }
    }
}

/// An action as reported by the host registry
#[derive(Debug, Clone)]
pub struct RegisteredAction {
    /// Stable identifier, e.g. `editor:trim-trailing-whitespace`
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Handler shape at the time the action was listed
    pub handler: ActionHandler,
}

impl RegisteredAction {
    pub fn new(id: impl Into<String>, name: impl Into<String>, handler: ActionHandler) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            handler,
        }
    }
}

/// Hotkey modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Ctrl on Linux/Windows, Cmd on macOS
    Mod,
    Ctrl,
    Shift,
    Alt,
}

/// A key chord bound to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl Hotkey {
    pub fn new(modifiers: Vec<Modifier>, key: impl Into<String>) -> Self {
        Self {
            modifiers,
            key: key.into(),
        }
    }
}

/// A command the extension asks the host to bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegistration {
    pub id: String,
    pub name: String,
    pub hotkeys: Vec<Hotkey>,
}

/// Host-wide action registry
pub trait ActionRegistry: Send + Sync {
    /// Every registered action, as the host currently reports it
    fn list_actions(&self) -> Result<Vec<RegisteredAction>>;

    /// Look up one action by id
    fn find_action(&self, id: &str) -> Option<RegisteredAction>;

    /// Bind a command (and its hotkeys) owned by the extension
    fn register_command(&self, registration: CommandRegistration) -> Result<()>;

    /// Drop the host's default hotkeys for a built-in action
    fn remove_default_hotkeys(&self, action_id: &str) -> Result<()>;
}

/// Kinds of document views a workspace can open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Markdown,
}

/// Opaque handle to a view opened in the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub u64);

/// A view showing a file, able to flush it
#[async_trait]
pub trait FileView: Send + Sync {
    fn file(&self) -> Option<FileRef>;

    async fn save(&self) -> Result<()>;
}

/// Host workspace: view lifecycle and the active file view
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Open a new (possibly invisible) view in the given mode
    async fn open_view(&self, mode: ViewMode) -> Result<ViewHandle>;

    /// Close a view previously returned by `open_view`
    fn detach_view(&self, handle: ViewHandle) -> Result<()>;

    /// The view currently focused on a file, if it can be saved
    fn active_file_view(&self) -> Option<Arc<dyn FileView>>;
}
