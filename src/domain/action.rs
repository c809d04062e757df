//! Catalog entries for host actions.

use serde::Serialize;

use crate::adapters::{ActionHandler, RegisteredAction};

/// Handler shape of an action, resolved once when the catalog is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Not invocable from an editor
    None,

    /// Unconditional editor handler
    Editor,

    /// Editor handler with an applicability check
    CheckedEditor,
}

impl From<&ActionHandler> for HandlerKind {
    fn from(handler: &ActionHandler) -> Self {
        match handler {
            ActionHandler::None => Self::None,
            ActionHandler::Editor(_) => Self::Editor,
            ActionHandler::CheckedEditor(_) => Self::CheckedEditor,
        }
    }
}

/// Immutable snapshot of one registered action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    /// Unique action id
    pub id: String,

    /// Display name
    pub name: String,

    /// How the action can be invoked
    pub handler: HandlerKind,
}

impl ActionDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, handler: HandlerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            handler,
        }
    }

    pub fn has_editor_handler(&self) -> bool {
        self.handler == HandlerKind::Editor
    }

    pub fn has_checked_editor_handler(&self) -> bool {
        self.handler == HandlerKind::CheckedEditor
    }

    /// True if the action can run against an editor at all
    pub fn is_editor_action(&self) -> bool {
        self.handler != HandlerKind::None
    }
}

impl From<&RegisteredAction> for ActionDescriptor {
    fn from(action: &RegisteredAction) -> Self {
        Self {
            id: action.id.clone(),
            name: action.name.clone(),
            handler: HandlerKind::from(&action.handler),
        }
    }
}
