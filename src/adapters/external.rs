//! External filter actions.
//!
//! A filter pipes the editor text through a user-declared command
//! (stdin to stdout) and replaces the buffer with the output, e.g.
//! `prettier --parser markdown`. Filters are declared in the config file
//! and registered as ordinary editor actions on the local host.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{ActionHandler, RegisteredAction, ViewContext};

/// Environment variable carrying the path of the file being saved
pub const FILE_ENV_VAR: &str = "CUSTOM_SAVE_FILE";

/// A command that rewrites the document text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalFilter {
    /// Action id, e.g. `prettier:format`
    pub id: String,

    /// Display name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,

    /// Program to run
    pub command: String,

    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExternalFilter {
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            command: command.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Run the filter over `input` and return its stdout
    pub fn run(&self, input: &str, ctx: &ViewContext) -> Result<String> {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(file) = &ctx.file {
            command.env(FILE_ENV_VAR, file.path());
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn filter '{}' ({})", self.id, self.command))?;

        // stdin is fed from its own thread while stdout is drained
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.to_owned();
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for filter '{}'", self.id))?;

        let written = writer.map(|w| w.join());

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Filter '{}' failed with exit code {}: {}",
                self.id,
                exit_code,
                stderr.trim()
            );
        }

        match written {
            Some(Ok(result)) => result
                .with_context(|| format!("Failed to write to stdin of filter '{}'", self.id))?,
            Some(Err(_)) => anyhow::bail!("stdin writer for filter '{}' panicked", self.id),
            None => {}
        }

        String::from_utf8(output.stdout)
            .with_context(|| format!("Output of filter '{}' is not valid UTF-8", self.id))
    }

    /// Registry entry for this filter
    pub fn to_action(&self) -> RegisteredAction {
        let filter = self.clone();
        RegisteredAction::new(
            self.id.clone(),
            self.display_name().to_string(),
            ActionHandler::editor(move |editor, ctx| {
                let output = filter.run(&editor.value(), ctx)?;
                editor.set_value(&output);
                Ok(())
            }),
        )
    }
}
