//! Local Host End-to-End Tests
//!
//! Load the extension against the file-system host and save real files.

use std::path::Path;
use std::sync::Arc;

use custom_save::adapters::builtin::{
    COLLAPSE_BLANK_LINES, ENSURE_FINAL_NEWLINE, TRIM_TRAILING_WHITESPACE,
};
use custom_save::adapters::{ExternalFilter, LocalHost};
use custom_save::core::JsonFilePersistence;
use custom_save::domain::StepStatus;
use custom_save::CustomSave;
use tempfile::TempDir;

async fn load_with(dir: &TempDir, host: Arc<LocalHost>, command_ids: &[&str]) -> CustomSave {
    let settings_path = dir.path().join("settings.json");
    let data = serde_json::json!({ "commandIds": command_ids });
    std::fs::write(&settings_path, serde_json::to_string(&data).unwrap()).unwrap();

    CustomSave::load(
        host.clone(),
        host,
        Arc::new(JsonFilePersistence::new(&settings_path)),
        "md",
    )
    .await
    .unwrap()
}

fn write_note(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_save_cleans_markdown_file_on_disk() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(LocalHost::new());
    let extension = load_with(
        &dir,
        host.clone(),
        &[TRIM_TRAILING_WHITESPACE, COLLAPSE_BLANK_LINES, ENSURE_FINAL_NEWLINE],
    )
    .await;
    let path = write_note(&dir, "today.md", "# Today  \n\n\n\n- item\t");

    let handle = host.open_file(&path).await.unwrap();
    let ctx = host.context(handle);
    let mut editor = host.editor(handle).unwrap();

    assert!(extension.on_save(true, &mut editor, &ctx).await);
    let run = extension.save(&mut editor, &ctx).await.unwrap();

    assert!(run.is_clean());
    assert_eq!(run.count(StepStatus::Completed), 3);
    assert_eq!(read(&path), "# Today\n\n- item\n");
}

#[tokio::test]
async fn test_non_markdown_file_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(LocalHost::new());
    let extension = load_with(&dir, host.clone(), &[TRIM_TRAILING_WHITESPACE]).await;
    let path = write_note(&dir, "notes.txt", "keep   ");

    let handle = host.open_file(&path).await.unwrap();
    let ctx = host.context(handle);
    let mut editor = host.editor(handle).unwrap();

    assert!(!extension.on_save(true, &mut editor, &ctx).await);
    assert_eq!(read(&path), "keep   ");
}

#[tokio::test]
async fn test_dangling_id_does_not_block_other_actions() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(LocalHost::new());
    let extension = load_with(
        &dir,
        host.clone(),
        &["plugin:uninstalled", TRIM_TRAILING_WHITESPACE],
    )
    .await;
    let path = write_note(&dir, "a.md", "text   \n");

    let handle = host.open_file(&path).await.unwrap();
    let ctx = host.context(handle);
    let mut editor = host.editor(handle).unwrap();
    let run = extension.save(&mut editor, &ctx).await.unwrap();

    assert_eq!(run.steps[0].status, StepStatus::NotFound);
    assert_eq!(run.steps[1].status, StepStatus::Completed);
    assert!(!run.is_clean());
    assert_eq!(read(&path), "text\n");
}

#[tokio::test]
async fn test_panel_changes_are_persisted() {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(LocalHost::new());
    let extension = load_with(&dir, host, &[]).await;

    let mut panel = extension.settings_panel();
    assert!(panel.select(ENSURE_FINAL_NEWLINE));
    panel.add().await.unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&read(&dir.path().join("settings.json"))).unwrap();
    assert_eq!(saved, serde_json::json!({ "commandIds": [ENSURE_FINAL_NEWLINE] }));

    // A second load sees the persisted list
    let reloaded = load_with_existing(&dir).await;
    assert_eq!(reloaded.settings().command_ids, vec![ENSURE_FINAL_NEWLINE]);
}

async fn load_with_existing(dir: &TempDir) -> CustomSave {
    let host = Arc::new(LocalHost::new());
    CustomSave::load(
        host.clone(),
        host,
        Arc::new(JsonFilePersistence::new(dir.path().join("settings.json"))),
        "md",
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_missing_settings_file_starts_empty() {
    let dir = TempDir::new().unwrap();

    let extension = load_with_existing(&dir).await;

    assert!(extension.settings().command_ids.is_empty());
    assert!(!extension.catalog().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_filter_rewrites_document() {
    let dir = TempDir::new().unwrap();
    let filter = ExternalFilter::new("shell:upper", "tr").with_args(["a-z", "A-Z"]);
    let host = Arc::new(LocalHost::with_filters(&[filter]));
    let extension = load_with(&dir, host.clone(), &["shell:upper"]).await;
    let path = write_note(&dir, "shout.md", "quiet words\n");

    let handle = host.open_file(&path).await.unwrap();
    let ctx = host.context(handle);
    let mut editor = host.editor(handle).unwrap();
    let run = extension.save(&mut editor, &ctx).await.unwrap();

    assert!(run.is_clean());
    assert_eq!(read(&path), "QUIET WORDS\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_external_filter_keeps_document() {
    let dir = TempDir::new().unwrap();
    let filter = ExternalFilter::new("shell:fail", "sh").with_args(["-c", "exit 3"]);
    let host = Arc::new(LocalHost::with_filters(&[filter]));
    let extension = load_with(&dir, host.clone(), &["shell:fail", ENSURE_FINAL_NEWLINE]).await;
    let path = write_note(&dir, "keep.md", "unchanged");

    let handle = host.open_file(&path).await.unwrap();
    let ctx = host.context(handle);
    let mut editor = host.editor(handle).unwrap();
    let run = extension.save(&mut editor, &ctx).await.unwrap();

    assert_eq!(run.steps[0].status, StepStatus::Failed);
    assert!(run.steps[0].error.as_deref().unwrap().contains("exit code 3"));
    assert_eq!(read(&path), "unchanged\n");
}
