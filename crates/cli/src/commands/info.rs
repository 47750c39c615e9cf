// `gdoc info`: document metadata and word count.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};

use gdoc_common::error::RemoteError;
use gdoc_common::types::{Author, FileInfo};
use gdoc_core::{CommandClass, InteractionKind, StateUpdate};

use crate::drive::ExportFormat;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Document id or URL.
    pub doc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfoResult {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub last_editor: Option<String>,
    pub mime_type: String,
    pub size: Option<i64>,
    /// `None` for files that cannot be exported as text.
    pub words: Option<usize>,
    #[serde(skip)]
    verbose: bool,
}

pub fn run(args: InfoArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    let (metadata, words) = session.block_on(async {
        let metadata = client.file_info(&doc_id).await?;
        let words = match client.export(&doc_id, ExportFormat::PlainText).await {
            Ok(text) => Some(text.split_whitespace().count()),
            Err(RemoteError::NotEditorDocument) => None,
            Err(error) => return Err(error),
        };
        Ok::<_, RemoteError>((metadata, words))
    })?;

    let version = metadata.version;
    let result = InfoResult::new(metadata, words, session.verbose);
    output::print_output(session.format, &result, format_human)?;

    session.finish(interaction, StateUpdate::new(InteractionKind::Inspect).with_version(version))
}

impl InfoResult {
    fn new(metadata: FileInfo, words: Option<usize>, verbose: bool) -> Self {
        Self {
            owner: metadata
                .owners
                .first()
                .map_or("Unknown", Author::display_label)
                .to_string(),
            last_editor: metadata
                .last_modifying_user
                .as_ref()
                .map(|user| user.display_label().to_string()),
            id: metadata.id,
            title: metadata.name,
            modified: metadata.modified_time,
            created: metadata.created_time,
            mime_type: metadata.mime_type,
            size: metadata.size,
            words,
            verbose,
        }
    }
}

fn format_human(result: &InfoResult) -> String {
    let words = result.words.map_or_else(|| "N/A".to_string(), |w| w.to_string());
    let mut lines = vec![format!("Title: {}", result.title), format!("Owner: {}", result.owner)];
    if result.verbose {
        lines.push(format!("Modified: {}", super::full_timestamp(result.modified)));
        lines.push(format!("Created: {}", super::full_timestamp(result.created)));
        lines.push(format!("Last editor: {}", result.last_editor.as_deref().unwrap_or("")));
        lines.push(format!("Type: {}", result.mime_type));
        lines.push(format!(
            "Size: {}",
            result.size.map_or_else(|| "N/A".to_string(), |s| s.to_string())
        ));
    } else {
        lines.push(format!("Modified: {}", super::date_only(result.modified)));
    }
    lines.push(format!("Words: {words}"));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
