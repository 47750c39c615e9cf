// `gdoc cat`: export document content, optionally annotated with comments.

use clap::Args;
use serde::{Deserialize, Serialize};

use gdoc_common::error::RemoteError;
use gdoc_core::{annotate, CommandClass, CommentQuery, Fetcher, InteractionKind, StateUpdate};

use crate::drive::ExportFormat;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct CatArgs {
    /// Document id or URL.
    pub doc: String,

    /// Export as plain text instead of markdown.
    #[arg(long, conflicts_with = "comments")]
    plain: bool,

    /// Number the lines and place comments under the lines they refer to.
    #[arg(long)]
    comments: bool,

    /// With --comments, include resolved comments.
    #[arg(long, requires = "comments")]
    all: bool,

    /// Truncate output to at most N bytes (0 = unlimited).
    #[arg(long, value_name = "N", default_value_t = 0)]
    max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatResult {
    pub content: String,
}

pub fn run(args: CatArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::Read, false)?;

    let client = session.client()?;
    let content = session.block_on(async {
        if args.comments {
            let text = client.export(&doc_id, ExportFormat::Markdown).await?;
            let comments = client.fetch_comments(&doc_id, &annotation_query(args.all)).await?;
            Ok::<_, RemoteError>(annotate(&text, &comments, args.all))
        } else {
            let format = if args.plain { ExportFormat::PlainText } else { ExportFormat::Markdown };
            client.export(&doc_id, format).await
        }
    })?;

    let result = CatResult { content: truncate_bytes(content, args.max_bytes) };
    output::print_output(session.format, &result, format_human)?;

    session.finish(interaction, StateUpdate::new(InteractionKind::Read))
}

/// Full listing with anchors; resolved threads only when they will be shown.
fn annotation_query(show_resolved: bool) -> CommentQuery {
    CommentQuery { include_resolved: show_resolved, ..CommentQuery::all() }
}

fn format_human(result: &CatResult) -> String {
    result.content.clone()
}

/// Cut to at most `max_bytes` bytes without splitting a character. Zero means no limit.
fn truncate_bytes(mut text: String, max_bytes: usize) -> String {
    if max_bytes == 0 || text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}
