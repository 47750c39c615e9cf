// `gdoc write`: overwrite the whole document from a local markdown file.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use gdoc_core::{CommandClass, InteractionKind, StateUpdate};

use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Document id or URL.
    pub doc: String,

    /// Local markdown file to upload.
    file: PathBuf,

    /// Overwrite even without a current read baseline.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteResult {
    pub written: bool,
    pub version: Option<i64>,
}

pub fn run(args: WriteArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let content = super::read_local_file(&args.file)?;

    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::BlockOnConflict, args.force)?;

    let client = session.client()?;
    let version = session.block_on(client.update_content(&doc_id, content))?;

    let result = WriteResult { written: true, version };
    output::print_output(session.format, &result, format_human)?;

    session.finish(interaction, StateUpdate::new(InteractionKind::Write).with_version(version))
}

fn format_human(_result: &WriteResult) -> String {
    "OK written\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn human_output() {
        let result = WriteResult { written: true, version: Some(12) };
        assert_eq!(format_human(&result), "OK written\n");
    }

    #[test]
    fn json_output_carries_version() {
        let result = WriteResult { written: true, version: Some(12) };
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &result, format_human).unwrap();
        let parsed: WriteResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, result);
    }
}
