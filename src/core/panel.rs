//! Settings panel view model.
//!
//! The panel renders into plain data ([`PanelView`]) that a host turns into
//! widgets: an "add" dropdown offering every catalog action not yet
//! selected, followed by one removable row per configured id.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{ActionDescriptor, Settings};
use crate::error::CustomSaveResult;

use super::catalog::ActionCatalog;
use super::settings_store::SettingsStore;

/// Id under which the hook registers its own save command
pub const SAVE_COMMAND_ID: &str = "custom-save:save";

const NOT_FOUND_MARKER: &str = "(not found)";
const NON_EDITOR_MARKER: &str = " (non-editor)";

/// One dropdown entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

/// One configured action row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    /// Stored action id
    pub id: String,

    /// Resolved display name, or the raw id plus a marker when dangling
    pub name: String,

    /// Catalog id shown as the row description (empty when dangling)
    pub description: String,

    /// True when the id no longer matches any catalog action
    pub not_found: bool,
}

/// Rendered state of the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    /// Addable actions, led by an empty "nothing selected" option
    pub options: Vec<DropdownOption>,

    /// Currently selected dropdown value ("" when none)
    pub selected: String,

    /// Configured actions in execution order
    pub entries: Vec<EntryRow>,
}

impl PanelView {
    /// Values a user can pick (excluding the empty option)
    pub fn addable_ids(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .map(|o| o.value.as_str())
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Add command ({} available)", self.addable_ids().count())?;
        for option in self.options.iter().filter(|o| !o.value.is_empty()) {
            let marker = if option.value == self.selected { "*" } else { " " };
            writeln!(f, " {} {:<40} {}", marker, option.value, option.label)?;
        }
        writeln!(f)?;

        if self.entries.is_empty() {
            return writeln!(f, "No commands run on save.");
        }

        writeln!(f, "Run on save:")?;
        for (i, entry) in self.entries.iter().enumerate() {
            let flag = if entry.not_found { "!" } else { " " };
            writeln!(f, "{}{:>3}. {:<40} {}", flag, i + 1, entry.name, entry.description)?;
        }
        Ok(())
    }
}

/// Ordered-list editor bound to one settings store and one catalog
pub struct SettingsPanel {
    store: Arc<SettingsStore>,
    catalog: Arc<ActionCatalog>,
    selected: String,
}

impl SettingsPanel {
    pub fn new(store: Arc<SettingsStore>, catalog: Arc<ActionCatalog>) -> Self {
        Self {
            store,
            catalog,
            selected: String::new(),
        }
    }

    /// Build the full view from current settings
    pub fn render(&self) -> PanelView {
        let settings = self.store.get();
        let options = self.options(&settings);

        // A selection that is no longer offered is dropped on redraw
        let selected = if options.iter().any(|o| o.value == self.selected) {
            self.selected.clone()
        } else {
            String::new()
        };

        let entries = settings
            .command_ids
            .iter()
            .map(|id| entry_row(id, self.catalog.get(id)))
            .collect();

        PanelView {
            options,
            selected,
            entries,
        }
    }

    /// Dropdown change. Only offered values can be selected; returns
    /// whether the value was accepted.
    pub fn select(&mut self, value: &str) -> bool {
        let settings = self.store.get();
        if value.is_empty() || self.options(&settings).iter().any(|o| o.value == value) {
            self.selected = value.to_string();
            true
        } else {
            debug!(value, "Ignoring selection of an action that is not offered");
            false
        }
    }

    /// "Add" button: append the selected id, then redraw
    pub async fn add(&mut self) -> CustomSaveResult<PanelView> {
        if self.selected.is_empty() {
            return Ok(self.render());
        }

        let id = self.selected.clone();
        self.store.update(|s| s.with_command(&id)).await?;
        self.selected.clear();
        info!(action_id = %id, "Added command to save sequence");

        Ok(self.render())
    }

    /// "Remove" button on a row: filter the id out, then redraw
    pub async fn remove(&mut self, id: &str) -> CustomSaveResult<PanelView> {
        self.store.update(|s| s.without_command(id)).await?;
        info!(action_id = %id, "Removed command from save sequence");

        Ok(self.render())
    }

    /// `catalog \ (selected ∪ {self})`, led by the empty option
    fn options(&self, settings: &Settings) -> Vec<DropdownOption> {
        let mut options = vec![DropdownOption {
            value: String::new(),
            label: String::new(),
        }];

        options.extend(
            self.catalog
                .iter()
                .filter(|a| a.id != SAVE_COMMAND_ID && !settings.contains(&a.id))
                .map(|a| DropdownOption {
                    value: a.id.clone(),
                    label: option_label(a),
                }),
        );

        options
    }
}

fn option_label(action: &ActionDescriptor) -> String {
    if action.is_editor_action() {
        action.name.clone()
    } else {
        format!("{}{}", action.name, NON_EDITOR_MARKER)
    }
}

fn entry_row(id: &str, action: Option<&ActionDescriptor>) -> EntryRow {
    match action {
        Some(action) => EntryRow {
            id: id.to_string(),
            name: action.name.clone(),
            description: action.id.clone(),
            not_found: false,
        },
        None => EntryRow {
            id: id.to_string(),
            name: format!("{} {}", id, NOT_FOUND_MARKER),
            description: String::new(),
            not_found: true,
        },
    }
}
