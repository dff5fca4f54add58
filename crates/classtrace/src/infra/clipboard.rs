//! Copying generated class names to the system clipboard.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Which backend accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopiedVia {
    System,
    Command(&'static str),
}

/// Clipboard access that prefers the native clipboard and otherwise shells out to the
/// platform's copy utility. Headless sessions usually end up on the second path.
pub struct ClassClipboard {
    native: Option<arboard::Clipboard>,
    commands: &'static [&'static [&'static str]],
}

impl ClassClipboard {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "native clipboard unavailable");
                None
            }
        };
        Self {
            native,
            commands: COPY_COMMANDS,
        }
    }

    /// Place `class_name` on the clipboard.
    pub fn copy_class(&mut self, class_name: &str) -> Result<CopiedVia> {
        if class_name.is_empty() {
            bail!("refusing to copy an empty class name");
        }

        if let Some(native) = self.native.as_mut() {
            match native.set_text(class_name.to_owned()) {
                Ok(()) => return Ok(CopiedVia::System),
                Err(err) => {
                    tracing::debug!(error = %err, "native clipboard rejected text");
                    self.native = None;
                }
            }
        }

        for command in self.commands {
            match run_copy_command(command, class_name) {
                Ok(program) => return Ok(CopiedVia::Command(program)),
                Err(err) => tracing::debug!(error = %err, "clipboard command failed"),
            }
        }

        bail!("no clipboard backend accepted the class name")
    }
}

impl Default for ClassClipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn run_copy_command(command: &[&'static str], text: &str) -> Result<&'static str> {
    let Some((&program, args)) = command.split_first() else {
        bail!("empty clipboard command");
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    // Dropping stdin closes the pipe; the child is reaped even when the write fails.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Err(io::Error::other("clipboard command has no stdin")),
    };
    let status = child
        .wait()
        .with_context(|| format!("{program} did not exit cleanly"))?;
    written.with_context(|| format!("failed to write to {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(program)
}

#[cfg(target_os = "macos")]
const COPY_COMMANDS: &[&[&str]] = &[&["pbcopy"]];

#[cfg(all(unix, not(target_os = "macos")))]
const COPY_COMMANDS: &[&[&str]] = &[
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["xsel", "--clipboard", "--input"],
];

#[cfg(target_os = "windows")]
const COPY_COMMANDS: &[&[&str]] = &[&["clip.exe"]];

#[cfg(not(any(unix, target_os = "windows")))]
const COPY_COMMANDS: &[&[&str]] = &[];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_class_is_rejected() {
        let mut clipboard = ClassClipboard {
            native: None,
            commands: &[],
        };
        assert!(clipboard.copy_class("").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn command_receives_text_on_stdin() {
        assert_eq!(run_copy_command(&["cat"], "shop--card").unwrap(), "cat");
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_still_waits_for_the_command() {
        let payload = "x".repeat(4 * 1024 * 1024);
        let err = run_copy_command(&["true"], &payload).unwrap_err();
        assert!(err.to_string().contains("failed to write to true"));
    }

    #[test]
    fn missing_backends_report_an_error() {
        let mut clipboard = ClassClipboard {
            native: None,
            commands: &[&["classtrace-no-such-clipboard-tool"]],
        };
        let err = clipboard.copy_class("shop--card").unwrap_err();
        assert!(err.to_string().contains("no clipboard backend"));
    }
}
