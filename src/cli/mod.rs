//! Command-line interface for custom-save.
//!
//! Drives the extension against the local file-system host: inspect the
//! action catalog, edit the run-on-save list, and save files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{FileRef, LocalHost, ViewContext};
use crate::config::{self, ResolvedConfig};
use crate::core::{ActionCatalog, JsonFilePersistence, SaveOrchestrator, SAVE_COMMAND_ID};
use crate::domain::{ActionDescriptor, HandlerKind, SaveRun, StepStatus};
use crate::plugin::CustomSave;

/// custom-save - run editor actions around every save
#[derive(Parser, Debug)]
#[command(name = "custom-save")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List actions captured from the host
    Actions {
        /// Include actions without an editor handler
        #[arg(short, long)]
        all: bool,
    },

    /// Show the settings panel
    Panel,

    /// Append an action to the run-on-save list
    Add {
        /// Action id (see `custom-save actions`)
        action_id: String,
    },

    /// Remove an action from the run-on-save list
    Remove {
        /// Action id
        action_id: String,
    },

    /// Save a file, running the configured actions
    Save {
        /// File to save
        file: PathBuf,

        /// Print the run record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match self.command {
            Commands::Actions { all } => list_actions(cfg, all).await,
            Commands::Panel => show_panel(cfg).await,
            Commands::Add { action_id } => add_action(cfg, &action_id).await,
            Commands::Remove { action_id } => remove_action(cfg, &action_id).await,
            Commands::Save { file, json } => save_file(cfg, file, json).await,
            Commands::Config => show_config(cfg),
        }
    }
}

/// Load the extension against a fresh local host
async fn load_extension(cfg: &ResolvedConfig) -> Result<(Arc<LocalHost>, CustomSave)> {
    let host = Arc::new(LocalHost::with_filters(&cfg.filters));
    let persistence = Arc::new(JsonFilePersistence::new(&cfg.settings_file));

    let extension = CustomSave::load(
        host.clone(),
        host.clone(),
        persistence,
        &cfg.markdown_extension,
    )
    .await?;

    Ok((host, extension))
}

/// List captured actions
async fn list_actions(cfg: &ResolvedConfig, all: bool) -> Result<()> {
    let (_host, extension) = load_extension(cfg).await?;
    let catalog = extension.catalog();

    if catalog.is_empty() {
        println!("No actions captured");
        return Ok(());
    }

    let settings = extension.settings();

    println!("{:<3} {:<40} {:<10} {}", "", "ID", "HANDLER", "NAME");
    println!("{}", "-".repeat(80));

    for action in listed_actions(catalog, all) {
        let handler = match action.handler {
            HandlerKind::None => "-",
            HandlerKind::Editor => "editor",
            HandlerKind::CheckedEditor => "checked",
        };
        let selected = if settings.contains(&action.id) { "*" } else { "" };
        println!("{:<3} {:<40} {:<10} {}", selected, action.id, handler, action.name);
    }

    Ok(())
}

/// Editor actions only, unless `all` is set
fn listed_actions(catalog: &ActionCatalog, all: bool) -> Vec<&ActionDescriptor> {
    if all {
        catalog.iter().collect()
    } else {
        catalog.editor_actions().collect()
    }
}

async fn show_panel(cfg: &ResolvedConfig) -> Result<()> {
    let (_host, extension) = load_extension(cfg).await?;
    print!("{}", extension.settings_panel().render());
    Ok(())
}

/// Add through the panel so only offered actions can be chosen
async fn add_action(cfg: &ResolvedConfig, action_id: &str) -> Result<()> {
    let (_host, extension) = load_extension(cfg).await?;
    let mut panel = extension.settings_panel();

    if !panel.select(action_id) {
        if action_id == SAVE_COMMAND_ID {
            anyhow::bail!("The save command cannot run itself");
        }
        if extension.settings().contains(action_id) {
            anyhow::bail!("'{}' already runs on save", action_id);
        }
        anyhow::bail!(
            "Unknown action '{}'. Run `custom-save actions --all` to list them",
            action_id
        );
    }

    let view = panel.add().await?;
    print!("{}", view);
    Ok(())
}

async fn remove_action(cfg: &ResolvedConfig, action_id: &str) -> Result<()> {
    let (_host, extension) = load_extension(cfg).await?;

    if !extension.settings().contains(action_id) {
        anyhow::bail!("'{}' is not in the run-on-save list", action_id);
    }

    let view = extension.settings_panel().remove(action_id).await?;
    print!("{}", view);
    Ok(())
}

/// Open a file in the local host and press "save" on it
async fn save_file(cfg: &ResolvedConfig, file: PathBuf, json: bool) -> Result<()> {
    let (host, extension) = load_extension(cfg).await?;
    ensure_applicable(extension.orchestrator(), &file)?;

    let handle = host.open_file(&file).await?;
    let ctx = host.context(handle);
    let mut editor = host
        .editor(handle)
        .with_context(|| format!("No editor for {}", file.display()))?;

    let run = extension
        .save(&mut editor, &ctx)
        .await
        .with_context(|| format!("No file open for {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_run(&run);
    }

    if !run.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}

/// Check the extension from the path alone, before the file is read
fn ensure_applicable(orchestrator: &SaveOrchestrator, file: &Path) -> Result<()> {
    if !orchestrator.check(&ViewContext::for_file(FileRef::new(file))) {
        anyhow::bail!(
            "{} is not a .{} file; custom save does not apply",
            file.display(),
            orchestrator.markdown_extension()
        );
    }
    Ok(())
}

fn print_run(run: &SaveRun) {
    println!("Run ID: {}", run.id);
    println!("File: {}", run.file.display());

    for save in &run.saves {
        let state = match (&save.error, save.attempted) {
            (Some(e), _) => format!("failed: {}", e),
            (None, true) => "ok".to_string(),
            (None, false) => "skipped (no active view)".to_string(),
        };
        println!("  save ({:?}): {}", save.phase, state);
    }

    if run.steps.is_empty() {
        println!("  no actions configured");
    }

    for step in &run.steps {
        let status = match step.status {
            StepStatus::Completed => "completed",
            StepStatus::NotFound => "not found",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        match &step.error {
            Some(e) => println!("  {:<40} {:<10} {}", step.action_id, status, e),
            None => println!("  {:<40} {:<10} {}ms", step.action_id, status, step.duration_ms),
        }
    }
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:          {}", cfg.home.display());
    println!("  Settings file: {}", cfg.settings_file.display());
    println!();
    println!("Markdown extension: .{}", cfg.markdown_extension);
    println!();
    println!("External actions:");
    if cfg.filters.is_empty() {
        println!("  (none)");
    } else {
        for filter in &cfg.filters {
            println!(
                "  {:<30} {} {}",
                filter.id,
                filter.command,
                filter.args.join(" ")
            );
        }
    }

    Ok(())
}
