// `gdoc diff`: compare the exported document with a local file before `write`.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};
use similar::TextDiff;

use gdoc_core::{CommandClass, InteractionKind, StateUpdate};

use crate::drive::ExportFormat;
use crate::exit_code::ExitCode;
use crate::output;
use crate::session::Session;

const CONTEXT_LINES: usize = 3;
const LABEL_ID_CHARS: usize = 12;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Document id or URL.
    pub doc: String,

    /// Local file to compare against.
    file: PathBuf,

    /// Compare against the plain-text export instead of markdown.
    #[arg(long)]
    plain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffResult {
    pub identical: bool,
    /// Unified diff from the document to the local file; empty when identical.
    pub diff: String,
}

impl DiffResult {
    fn new(diff: String) -> Self {
        Self { identical: diff.is_empty(), diff }
    }

    /// Differences are reported through the exit status, like diff(1).
    fn exit_code(&self) -> ExitCode {
        if self.identical {
            ExitCode::Success
        } else {
            ExitCode::Error
        }
    }
}

pub fn run(args: DiffArgs, session: &Session) -> anyhow::Result<ExitCode> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let local = super::read_local_file(&args.file)?;

    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    let format = if args.plain { ExportFormat::PlainText } else { ExportFormat::Markdown };
    let remote = session.block_on(client.export(&doc_id, format))?;

    let result = DiffResult::new(unified_diff(&remote, &local, &doc_id, &args.file));
    output::print_output(session.format, &result, format_human)?;

    let version = super::current_version(session, &doc_id)?;
    let update = StateUpdate::new(InteractionKind::Inspect).with_version(Some(version));
    session.finish(interaction, update)?;
    Ok(result.exit_code())
}

fn unified_diff(remote: &str, local: &str, doc_id: &str, path: &Path) -> String {
    let from = format!("gdoc:{}", doc_id.chars().take(LABEL_ID_CHARS).collect::<String>());
    let to = path.display().to_string();
    let diff = TextDiff::from_lines(remote, local);
    let unified = diff.unified_diff().context_radius(CONTEXT_LINES).header(&from, &to).to_string();
    unified
}

fn format_human(result: &DiffResult) -> String {
    if result.identical {
        "OK identical\n".to_string()
    } else {
        result.diff.clone()
    }
}
