// Output rendering for the CLI.
//
// Document content and command results go to stdout; banners, warnings, and
// errors go to stderr. `--json` switches stdout to one JSON object per command
// and errors to a `{"error": {...}}` object on stderr.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use gdoc_common::doc_id::DocIdError;
use gdoc_common::error::RemoteError;

use crate::exit_code::{ConflictBlocked, UsageError};

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    /// One JSON object per command on stdout.
    Json,
}

impl OutputFormat {
    pub fn detect(json: bool) -> Self {
        match json {
            true => Self::Json,
            false => Self::Human,
        }
    }
}

/// Severity of a stderr diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Error,
    Warning,
}

impl Tone {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "ERR",
            Self::Warning => "WARN",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Error => "\x1b[31m",
            Self::Warning => "\x1b[33m",
        }
    }

    /// `LABEL: message`, with the label colored when stderr is a terminal.
    fn line(self, message: &str, colored: bool) -> String {
        if colored {
            format!("{}{}:{RESET} {message}", self.color(), self.label())
        } else {
            format!("{}: {message}", self.label())
        }
    }
}

/// Print a command result to stdout.
pub fn print_output<T, F>(format: OutputFormat, value: &T, render_human: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, render_human)
}

/// Write a command result. Human text is written as rendered, with no newline
/// added, so exported document bodies come through byte for byte. JSON is
/// newline-terminated.
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    render_human: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if format == OutputFormat::Human {
        return writer.write_all(render_human(value).as_bytes());
    }
    let mut payload = serde_json::to_vec(value).map_err(io::Error::other)?;
    payload.push(b'\n');
    writer.write_all(&payload)
}

/// Warnings stay human-readable even under `--json`.
pub fn print_warning(message: &str) {
    let line = Tone::Warning.line(message, io::stderr().is_terminal());
    let _ = writeln!(io::stderr().lock(), "{line}");
}

// ── Errors ─────────────────────────────────────────────────────────

/// A failure as shown to the caller: a stable code plus a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
}

impl ErrorReport {
    /// Classify by the first typed error found in the chain.
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(remote) = cause.downcast_ref::<RemoteError>() {
                return Self { code: remote_code(remote), message: remote.to_string() };
            }
            if let Some(blocked) = cause.downcast_ref::<ConflictBlocked>() {
                return Self { code: "CONFLICT", message: blocked.to_string() };
            }
            if let Some(usage) = cause.downcast_ref::<UsageError>() {
                return Self { code: "USAGE", message: usage.to_string() };
            }
            if let Some(bad_id) = cause.downcast_ref::<DocIdError>() {
                return Self { code: "USAGE", message: bad_id.to_string() };
            }
        }
        Self { code: "ERROR", message: format!("{error:#}") }
    }

    fn render(&self, format: OutputFormat, colored: bool) -> String {
        match format {
            OutputFormat::Human => Tone::Error.line(&self.message, colored),
            OutputFormat::Json => serde_json::json!({ "error": self }).to_string(),
        }
    }
}

fn remote_code(error: &RemoteError) -> &'static str {
    match error {
        RemoteError::Auth(_) => "AUTH_FAILURE",
        RemoteError::PermissionDenied(_) => "PERMISSION_DENIED",
        RemoteError::NotFound(_) => "DOCUMENT_NOT_FOUND",
        RemoteError::NotEditorDocument => "NOT_EDITOR_DOCUMENT",
        RemoteError::Api { .. } => "API_ERROR",
        RemoteError::Transport(_) => "NETWORK_ERROR",
        RemoteError::Decode(_) => "BAD_RESPONSE",
    }
}

/// Report a failed command on stderr.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let stderr = io::stderr();
    let line = ErrorReport::from_anyhow(error).render(format, stderr.is_terminal());
    let _ = writeln!(stderr.lock(), "{line}");
}
