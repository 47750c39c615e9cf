// `gdoc comment-info`: show one comment thread.

use clap::Args;
use serde::Serialize;

use gdoc_common::types::{author_label, Comment};
use gdoc_core::{CommandClass, InteractionKind, StateUpdate};

use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct CommentInfoArgs {
    /// Document id or URL.
    pub doc: String,

    /// Comment to show.
    comment_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentInfoResult {
    pub comment: Comment,
    #[serde(skip)]
    verbose: bool,
}

pub fn run(args: CommentInfoArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    let comment = session.block_on(client.get_comment(&doc_id, &args.comment_id))?;

    let result = CommentInfoResult { comment, verbose: session.verbose };
    output::print_output(session.format, &result, format_human)?;

    session.finish(interaction, StateUpdate::new(InteractionKind::Inspect))
}

fn format_human(result: &CommentInfoResult) -> String {
    let comment = &result.comment;
    if !result.verbose {
        let mut out = format!(
            "#{} [{}] {} {}\n  \"{}\"\n",
            comment.id,
            comment.status(),
            comment.author_label(),
            super::date_only(comment.created_time),
            comment.content
        );
        match comment.replies.len() {
            0 => {}
            1 => out.push_str("  1 reply\n"),
            n => out.push_str(&format!("  {n} replies\n")),
        }
        return out;
    }

    let mut out = format!(
        "#{} [{}] {} {}\n  \"{}\"\n",
        comment.id,
        comment.status(),
        comment.author_label(),
        super::full_timestamp(comment.created_time),
        comment.content
    );
    if let Some(anchor) = comment.anchor() {
        out.push_str(&format!("  on \"{anchor}\"\n"));
    }
    out.push_str(&format!("  Modified: {}\n", super::full_timestamp(comment.modified_time)));
    for reply in &comment.replies {
        let author = author_label(reply.author.as_ref());
        let created = super::full_timestamp(reply.created_time);
        if !reply.content.is_empty() {
            out.push_str(&format!("  -> {author} {created}: \"{}\"\n", reply.content));
        } else if let Some(action) = reply.action {
            out.push_str(&format!("  -> {author} {created}: [{}]\n", action.as_str()));
        }
    }
    out
}
