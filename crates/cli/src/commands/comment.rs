// `gdoc comment`: start a new comment thread.

use clap::Args;

use gdoc_core::{CommandClass, CommentPatch, InteractionKind, StateUpdate};

use super::CommentStatus;
use crate::exit_code::UsageError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct CommentArgs {
    /// Document id or URL.
    pub doc: String,

    /// Comment text.
    text: String,

    /// Quoted text the comment refers to.
    #[arg(long)]
    quote: Option<String>,
}

pub fn run(args: CommentArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    if args.text.trim().is_empty() {
        return Err(UsageError::new("comment text must not be empty").into());
    }
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    let created =
        session.block_on(client.create_comment(&doc_id, &args.text, args.quote.as_deref()))?;
    let version = super::current_version(session, &doc_id)?;

    let result = CommentStatus::new(&created.id, "created");
    output::print_output(session.format, &result, format_human)?;

    let update = StateUpdate::new(InteractionKind::Write)
        .with_version(Some(version))
        .with_patch(CommentPatch::created(created.id));
    session.finish(interaction, update)
}

fn format_human(result: &CommentStatus) -> String {
    format!("OK comment #{}\n", result.id)
}
