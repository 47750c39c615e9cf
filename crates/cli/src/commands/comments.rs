// `gdoc comments`: list the comment threads on a document.

use clap::Args;
use serde::Serialize;

use gdoc_common::types::{author_label, Comment};
use gdoc_core::{CommandClass, CommentQuery, Fetcher, InteractionKind, StateUpdate};

use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct CommentsArgs {
    /// Document id or URL.
    pub doc: String,

    /// Include resolved comments.
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsResult {
    pub comments: Vec<Comment>,
    #[serde(skip)]
    verbose: bool,
}

pub fn run(args: CommentsArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    // Separate from the pre-flight listing, which is incremental.
    let client = session.client()?;
    let query =
        CommentQuery { include_resolved: args.all, include_anchor: false, ..CommentQuery::all() };
    let comments = session.block_on(client.fetch_comments(&doc_id, &query))?;

    let result = CommentsResult { comments, verbose: session.verbose };
    output::print_output(session.format, &result, format_human)?;

    session.finish(interaction, StateUpdate::new(InteractionKind::Inspect))
}

fn format_human(result: &CommentsResult) -> String {
    if result.comments.is_empty() {
        return "No comments.\n".to_string();
    }
    let mut out = String::new();
    for comment in &result.comments {
        let date = if result.verbose {
            super::full_timestamp(comment.created_time)
        } else {
            super::date_only(comment.created_time)
        };
        out.push_str(&format!(
            "#{} [{}] {} {date}\n",
            comment.id,
            comment.status(),
            comment.author_label()
        ));
        out.push_str(&format!("  \"{}\"\n", comment.content));
        for reply in comment.replies.iter().filter(|reply| !reply.content.is_empty()) {
            out.push_str(&format!(
                "  -> {}: \"{}\"\n",
                author_label(reply.author.as_ref()),
                reply.content
            ));
        }
    }
    out
}
