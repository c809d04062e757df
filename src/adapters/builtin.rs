//! Built-in actions registered by the local host.
//!
//! The editor actions are small text clean-ups, the kind of thing a user
//! wants to run on every save. Two non-editor actions round out the
//! registry the way a real host reports app-level commands.

use super::{ActionHandler, RegisteredAction};

/// The host's default save action, whose hotkey the hook takes over
pub const DEFAULT_SAVE_ACTION_ID: &str = "editor:save-file";

pub const TRIM_TRAILING_WHITESPACE: &str = "editor:trim-trailing-whitespace";
pub const ENSURE_FINAL_NEWLINE: &str = "editor:ensure-final-newline";
pub const COLLAPSE_BLANK_LINES: &str = "editor:collapse-blank-lines";
pub const SORT_LINES: &str = "editor:sort-lines";
pub const OPEN_SETTINGS: &str = "app:open-settings";

/// Every built-in action, in registration order
pub fn builtin_actions() -> Vec<RegisteredAction> {
    vec![
        RegisteredAction::new(
            TRIM_TRAILING_WHITESPACE,
            "Trim trailing whitespace",
            ActionHandler::checked(|checking, editor, _ctx| {
                let text = editor.value();
                let trimmed = trim_trailing_whitespace(&text);
                if trimmed == text {
                    return Ok(false);
                }
                if !checking {
                    editor.set_value(&trimmed);
                }
                Ok(true)
            }),
        ),
        RegisteredAction::new(
            ENSURE_FINAL_NEWLINE,
            "Ensure final newline",
            ActionHandler::editor(|editor, _ctx| {
                let text = editor.value();
                editor.set_value(&ensure_final_newline(&text));
                Ok(())
            }),
        ),
        RegisteredAction::new(
            COLLAPSE_BLANK_LINES,
            "Collapse consecutive blank lines",
            ActionHandler::editor(|editor, _ctx| {
                let text = editor.value();
                editor.set_value(&collapse_blank_lines(&text));
                Ok(())
            }),
        ),
        RegisteredAction::new(
            SORT_LINES,
            "Sort lines",
            ActionHandler::checked(|checking, editor, _ctx| {
                let text = editor.value();
                if text.is_empty() {
                    return Ok(false);
                }
                if !checking {
                    editor.set_value(&sort_lines(&text));
                }
                Ok(true)
            }),
        ),
        RegisteredAction::new(OPEN_SETTINGS, "Open settings", ActionHandler::None),
        RegisteredAction::new(DEFAULT_SAVE_ACTION_ID, "Save current file", ActionHandler::None),
    ]
}

/// Strip spaces and tabs at the end of every line, keeping `\r\n` endings
pub fn trim_trailing_whitespace(text: &str) -> String {
    text.split('\n')
        .map(|line| match line.strip_suffix('\r') {
            Some(body) => format!("{}\r", body.trim_end_matches([' ', '\t'])),
            None => line.trim_end_matches([' ', '\t']).to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn ensure_final_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

/// Reduce every run of blank lines to a single blank line
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in text.split('\n') {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push(line);
        previous_blank = blank;
    }

    out.join("\n")
}

pub fn sort_lines(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    let mut sorted = lines.join("\n");
    if text.ends_with('\n') {
        sorted.push('\n');
    }
    sorted
}
