// `gdoc reopen`: reopen a resolved comment thread.

use clap::Args;

use gdoc_common::types::ReplyAction;
use gdoc_core::{CommandClass, CommentPatch, InteractionKind, StateUpdate};

use super::CommentStatus;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ReopenArgs {
    /// Document id or URL.
    pub doc: String,

    /// Comment to reopen.
    comment_id: String,
}

pub fn run(args: ReopenArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    session.block_on(client.create_reply(&doc_id, &args.comment_id, None, Some(ReplyAction::Reopen)))?;
    let version = super::current_version(session, &doc_id)?;

    let result = CommentStatus::new(&args.comment_id, "reopened");
    output::print_output(session.format, &result, format_human)?;

    let update = StateUpdate::new(InteractionKind::Write)
        .with_version(Some(version))
        .with_patch(CommentPatch::reopened(args.comment_id));
    session.finish(interaction, update)
}

fn format_human(result: &CommentStatus) -> String {
    format!("OK reopened comment #{}\n", result.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_output() {
        assert_eq!(
            format_human(&CommentStatus::new("AAA", "reopened")),
            "OK reopened comment #AAA\n"
        );
    }
}
