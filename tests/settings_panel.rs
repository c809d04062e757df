//! Settings Panel Integration Tests
//!
//! Add/remove flows, dropdown filtering and dangling entries.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use custom_save::core::{
    ActionCatalog, MemoryPersistence, SettingsPanel, SettingsPersistence, SettingsStore,
    SAVE_COMMAND_ID,
};
use custom_save::domain::{ActionDescriptor, HandlerKind, Settings};
use custom_save::CustomSaveError;
use serde_json::Value;
use tokio_test::assert_ok;

fn catalog() -> Arc<ActionCatalog> {
    Arc::new(ActionCatalog::new(vec![
        ActionDescriptor::new("editor:trim", "Trim trailing whitespace", HandlerKind::CheckedEditor),
        ActionDescriptor::new("editor:newline", "Ensure final newline", HandlerKind::Editor),
        ActionDescriptor::new("app:open-settings", "Open settings", HandlerKind::None),
        ActionDescriptor::new(SAVE_COMMAND_ID, "Save file", HandlerKind::None),
    ]))
}

async fn panel_with(command_ids: &[&str]) -> (Arc<SettingsStore>, SettingsPanel) {
    let settings = Settings::new(command_ids.iter().map(|s| s.to_string()).collect());
    let persistence = MemoryPersistence::with_data(serde_json::to_value(&settings).unwrap());
    let store = Arc::new(SettingsStore::new(Arc::new(persistence)));
    store.load().await.unwrap();
    let panel = SettingsPanel::new(store.clone(), catalog());
    (store, panel)
}

#[tokio::test]
async fn test_dropdown_excludes_self_and_selected() {
    let (_store, panel) = panel_with(&["editor:trim"]).await;
    let view = panel.render();

    assert_eq!(view.options[0].value, "");
    let addable: Vec<_> = view.addable_ids().collect();
    assert_eq!(addable, vec!["editor:newline", "app:open-settings"]);
    assert!(!addable.contains(&SAVE_COMMAND_ID));
    assert!(!addable.contains(&"editor:trim"));
}

#[tokio::test]
async fn test_non_editor_options_are_labelled() {
    let (_store, panel) = panel_with(&[]).await;
    let view = panel.render();

    let label = |id: &str| {
        view.options
            .iter()
            .find(|o| o.value == id)
            .map(|o| o.label.clone())
            .unwrap()
    };
    assert_eq!(label("editor:trim"), "Trim trailing whitespace");
    assert_eq!(label("app:open-settings"), "Open settings (non-editor)");
}

#[tokio::test]
async fn test_add_appends_selected_action() {
    let (store, mut panel) = panel_with(&["editor:trim"]).await;

    assert!(panel.select("editor:newline"));
    assert_eq!(panel.render().selected, "editor:newline");

    let view = assert_ok!(panel.add().await);

    assert_eq!(store.get().command_ids, vec!["editor:trim", "editor:newline"]);
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.selected, "");
    assert!(!view.addable_ids().any(|id| id == "editor:newline"));
}

#[tokio::test]
async fn test_add_without_selection_is_noop() {
    let (store, mut panel) = panel_with(&["editor:trim"]).await;

    panel.add().await.unwrap();

    assert_eq!(store.get().command_ids, vec!["editor:trim"]);
}

#[tokio::test]
async fn test_repeated_adds_never_duplicate() {
    let (store, mut panel) = panel_with(&[]).await;

    for id in ["editor:trim", "editor:newline", "editor:trim", "editor:newline", "editor:trim"] {
        if panel.select(id) {
            panel.add().await.unwrap();
        }
    }

    let ids = store.get().command_ids.clone();
    assert_eq!(ids, vec!["editor:trim", "editor:newline"]);
}

#[tokio::test]
async fn test_self_and_unknown_ids_cannot_be_selected() {
    let (_store, mut panel) = panel_with(&[]).await;

    assert!(!panel.select(SAVE_COMMAND_ID));
    assert!(!panel.select("not.in.catalog"));
    assert!(panel.select(""));
}

#[tokio::test]
async fn test_add_then_remove_round_trips() {
    let (store, mut panel) = panel_with(&["editor:trim", "app:open-settings"]).await;
    let before = store.get().clone();

    assert!(panel.select("editor:newline"));
    panel.add().await.unwrap();
    panel.remove("editor:newline").await.unwrap();

    assert_eq!(*store.get(), *before);
}

#[tokio::test]
async fn test_dangling_entry_is_marked_and_removable() {
    let (store, mut panel) = panel_with(&["editor:trim", "plugin:uninstalled"]).await;

    let view = panel.render();
    let dangling = &view.entries[1];
    assert!(dangling.not_found);
    assert_eq!(dangling.name, "plugin:uninstalled (not found)");
    assert_eq!(dangling.description, "");

    let resolved = &view.entries[0];
    assert!(!resolved.not_found);
    assert_eq!(resolved.name, "Trim trailing whitespace");
    assert_eq!(resolved.description, "editor:trim");

    let view = panel.remove("plugin:uninstalled").await.unwrap();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(store.get().command_ids, vec!["editor:trim"]);
}

#[tokio::test]
async fn test_empty_catalog_offers_nothing() {
    let store = Arc::new(SettingsStore::new(Arc::new(MemoryPersistence::new())));
    let panel = SettingsPanel::new(store, Arc::new(ActionCatalog::default()));

    let view = panel.render();
    assert_eq!(view.options.len(), 1);
    assert_eq!(view.addable_ids().count(), 0);
}

struct ReadOnlyPersistence;

#[async_trait]
impl SettingsPersistence for ReadOnlyPersistence {
    async fn load_data(&self) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn save_data(&self, _data: &Value) -> Result<()> {
        anyhow::bail!("read-only file system")
    }
}

#[tokio::test]
async fn test_persistence_failure_leaves_panel_unchanged() {
    let store = Arc::new(SettingsStore::new(Arc::new(ReadOnlyPersistence)));
    store.load().await.unwrap();
    let mut panel = SettingsPanel::new(store.clone(), catalog());

    assert!(panel.select("editor:trim"));
    let result = panel.add().await;

    assert!(matches!(result, Err(CustomSaveError::Persistence(_))));
    assert!(store.get().command_ids.is_empty());
    assert!(panel.render().entries.is_empty());
    // The selection survives so the user can retry
    assert_eq!(panel.render().selected, "editor:trim");
}
