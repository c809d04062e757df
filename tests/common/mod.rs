//! Fake host shared by the integration tests.
//!
//! Every host interaction (view open/detach, save, handler call) is
//! appended to one event log so tests can assert on exact ordering.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use custom_save::adapters::{
    ActionHandler, ActionRegistry, CommandRegistration, Editor, FileRef, FileView,
    RegisteredAction, ViewContext, ViewHandle, ViewMode, Workspace,
};

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn push(log: &EventLog, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

/// Editor over a plain string
#[derive(Debug, Default)]
pub struct FakeEditor {
    pub text: String,
}

impl FakeEditor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl Editor for FakeEditor {
    fn value(&self) -> String {
        self.text.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.text = value.to_string();
    }
}

pub fn markdown_context() -> ViewContext {
    ViewContext::for_file(FileRef::new("notes/today.md"))
}

/// Editor action that logs `invoke:<id>`
pub fn recording_action(log: &EventLog, id: &str) -> RegisteredAction {
    let log = log.clone();
    let event = format!("invoke:{}", id);
    RegisteredAction::new(
        id,
        format!("Action {}", id),
        ActionHandler::editor(move |_, _| {
            push(&log, event.clone());
            Ok(())
        }),
    )
}

/// Checked action that logs `check:<id>:<checking>`
pub fn recording_checked_action(log: &EventLog, id: &str) -> RegisteredAction {
    let log = log.clone();
    let id_owned = id.to_string();
    RegisteredAction::new(
        id,
        format!("Checked {}", id),
        ActionHandler::checked(move |checking, _, _| {
            push(&log, format!("check:{}:{}", id_owned, checking));
            Ok(true)
        }),
    )
}

/// Editor action that logs and then returns an error
pub fn failing_action(log: &EventLog, id: &str) -> RegisteredAction {
    let log = log.clone();
    let event = format!("invoke:{}", id);
    RegisteredAction::new(
        id,
        format!("Failing {}", id),
        ActionHandler::editor(move |_, _| {
            push(&log, event.clone());
            anyhow::bail!("formatter crashed")
        }),
    )
}

/// Editor action that logs and then panics
pub fn panicking_action(log: &EventLog, id: &str) -> RegisteredAction {
    let log = log.clone();
    let event = format!("invoke:{}", id);
    RegisteredAction::new(
        id,
        format!("Panicking {}", id),
        ActionHandler::editor(move |_, _| {
            push(&log, event.clone());
            panic!("handler blew up")
        }),
    )
}

struct FakeFileView {
    log: EventLog,
    fail: bool,
}

#[async_trait]
impl FileView for FakeFileView {
    fn file(&self) -> Option<FileRef> {
        Some(FileRef::new("notes/today.md"))
    }

    async fn save(&self) -> Result<()> {
        push(&self.log, "save");
        if self.fail {
            anyhow::bail!("disk full");
        }
        Ok(())
    }
}

/// Registry and workspace in one, recording everything
pub struct FakeHost {
    pub log: EventLog,
    actions: Mutex<Vec<RegisteredAction>>,
    open_views: Mutex<HashSet<u64>>,
    next_view: AtomicU64,
    pub registered: Mutex<Vec<CommandRegistration>>,
    pub removed_hotkeys: Mutex<Vec<String>>,
    pub has_active_view: bool,
    pub fail_saves: bool,
    pub fail_listing: bool,
    pub fail_open_view: bool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            actions: Mutex::new(Vec::new()),
            open_views: Mutex::new(HashSet::new()),
            next_view: AtomicU64::new(0),
            registered: Mutex::new(Vec::new()),
            removed_hotkeys: Mutex::new(Vec::new()),
            has_active_view: true,
            fail_saves: false,
            fail_listing: false,
            fail_open_view: false,
        }
    }

    pub fn add_action(&self, action: RegisteredAction) {
        self.actions.lock().unwrap().push(action);
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn open_view_count(&self) -> usize {
        self.open_views.lock().unwrap().len()
    }

    pub fn save_count(&self) -> usize {
        self.events().iter().filter(|e| *e == "save").count()
    }
}

impl ActionRegistry for FakeHost {
    fn list_actions(&self) -> Result<Vec<RegisteredAction>> {
        push(&self.log, "list_actions");
        if self.fail_listing {
            anyhow::bail!("registry unavailable");
        }
        Ok(self.actions.lock().unwrap().clone())
    }

    fn find_action(&self, id: &str) -> Option<RegisteredAction> {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    fn register_command(&self, registration: CommandRegistration) -> Result<()> {
        self.registered.lock().unwrap().push(registration);
        Ok(())
    }

    fn remove_default_hotkeys(&self, action_id: &str) -> Result<()> {
        self.removed_hotkeys
            .lock()
            .unwrap()
            .push(action_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl Workspace for FakeHost {
    async fn open_view(&self, _mode: ViewMode) -> Result<ViewHandle> {
        if self.fail_open_view {
            anyhow::bail!("cannot create leaf");
        }
        let id = self.next_view.fetch_add(1, Ordering::SeqCst) + 1;
        self.open_views.lock().unwrap().insert(id);
        push(&self.log, format!("open_view:{}", id));
        Ok(ViewHandle(id))
    }

    fn detach_view(&self, handle: ViewHandle) -> Result<()> {
        push(&self.log, format!("detach_view:{}", handle.0));
        if !self.open_views.lock().unwrap().remove(&handle.0) {
            anyhow::bail!("view {} not open", handle.0);
        }
        Ok(())
    }

    fn active_file_view(&self) -> Option<Arc<dyn FileView>> {
        if !self.has_active_view {
            return None;
        }
        Some(Arc::new(FakeFileView {
            log: self.log.clone(),
            fail: self.fail_saves,
        }))
    }
}
