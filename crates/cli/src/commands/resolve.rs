// `gdoc resolve`: mark a comment thread resolved, optionally with a closing message.

use clap::Args;

use gdoc_common::types::ReplyAction;
use gdoc_core::{CommandClass, CommentPatch, InteractionKind, StateUpdate};

use super::CommentStatus;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Document id or URL.
    pub doc: String,

    /// Comment to resolve.
    comment_id: String,

    /// Message posted with the resolution.
    #[arg(long, short)]
    message: Option<String>,
}

pub fn run(args: ResolveArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    session.block_on(client.create_reply(
        &doc_id,
        &args.comment_id,
        args.message.as_deref(),
        Some(ReplyAction::Resolve),
    ))?;
    let version = super::current_version(session, &doc_id)?;

    let result = CommentStatus::new(&args.comment_id, "resolved");
    output::print_output(session.format, &result, format_human)?;

    let update = StateUpdate::new(InteractionKind::Write)
        .with_version(Some(version))
        .with_patch(CommentPatch::resolved(args.comment_id));
    session.finish(interaction, update)
}

fn format_human(result: &CommentStatus) -> String {
    format!("OK resolved comment #{}\n", result.id)
}
