// `gdoc edit`: targeted find-and-replace in a document.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use gdoc_common::error::RemoteError;
use gdoc_core::{CommandClass, Fetcher, InteractionKind, StateUpdate};

use crate::drive::ExportFormat;
use crate::exit_code::UsageError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document id or URL.
    pub doc: String,

    /// Text to find.
    old_text: Option<String>,

    /// Replacement text.
    new_text: Option<String>,

    /// Replace every occurrence instead of requiring a unique match.
    #[arg(long)]
    all: bool,

    /// Match case when searching.
    #[arg(long)]
    case_sensitive: bool,

    /// Read the text to find from a file.
    #[arg(long, value_name = "PATH")]
    old_file: Option<PathBuf>,

    /// Read the replacement text from a file.
    #[arg(long, value_name = "PATH")]
    new_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditResult {
    pub replaced: u64,
}

pub fn run(args: EditArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let (old_text, new_text) = resolve_texts(&args)?;

    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::WarnOnConflict, false)?;

    let client = session.client()?;
    let plain = session.block_on(client.export(&doc_id, ExportFormat::PlainText))?;
    let matches = count_matches(&plain, &old_text, args.case_sensitive);
    check_match_count(matches, args.all)?;

    let (replaced, version) = session.block_on(async {
        let replaced = client
            .replace_all_text(&doc_id, &old_text, &new_text, args.case_sensitive)
            .await?;
        let revision = client.fetch_revision(&doc_id).await?;
        Ok::<_, RemoteError>((replaced, revision.version))
    })?;

    let result = EditResult { replaced };
    output::print_output(session.format, &result, format_human)?;

    session.finish(
        interaction,
        StateUpdate::new(InteractionKind::Write).with_version(Some(version)),
    )
}

/// Positional texts, or the `--old-file`/`--new-file` pair. Resolved before any
/// remote call so bad input fails fast.
fn resolve_texts(args: &EditArgs) -> Result<(String, String), UsageError> {
    let (old_text, new_text) = match (&args.old_file, &args.new_file) {
        (Some(old_file), Some(new_file)) => (
            strip_one_newline(super::read_local_file(old_file)?),
            strip_one_newline(super::read_local_file(new_file)?),
        ),
        (Some(_), None) | (None, Some(_)) => {
            return Err(UsageError::new("--old-file and --new-file must be used together"));
        }
        (None, None) => match (&args.old_text, &args.new_text) {
            (Some(old_text), Some(new_text)) => (old_text.clone(), new_text.clone()),
            _ => {
                return Err(UsageError::new(
                    "old_text and new_text required (or use --old-file/--new-file)",
                ));
            }
        },
    };
    if old_text.is_empty() {
        return Err(UsageError::new("text to find must not be empty"));
    }
    Ok((old_text, new_text))
}

/// Editors append a newline to files; drop exactly one.
fn strip_one_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

/// Non-overlapping occurrences of `needle` in `haystack`.
fn count_matches(haystack: &str, needle: &str, case_sensitive: bool) -> usize {
    if needle.is_empty() {
        return 0;
    }
    if case_sensitive {
        haystack.matches(needle).count()
    } else {
        haystack.to_lowercase().matches(&needle.to_lowercase()).count()
    }
}

fn check_match_count(matches: usize, replace_all: bool) -> Result<(), UsageError> {
    match matches {
        0 => Err(UsageError::new("no match found")),
        1 => Ok(()),
        n if replace_all => {
            tracing::debug!(matches = n, "replacing every occurrence");
            Ok(())
        }
        n => Err(UsageError::new(format!("multiple matches ({n} found). Use --all"))),
    }
}

fn format_human(result: &EditResult) -> String {
    let label = if result.replaced == 1 { "occurrence" } else { "occurrences" };
    format!("OK replaced {} {label}\n", result.replaced)
}
