// `gdoc reply`: add a reply to an existing comment thread.

use clap::Args;
use serde::{Deserialize, Serialize};

use gdoc_core::{CommandClass, CommentPatch, InteractionKind, StateUpdate};

use crate::exit_code::UsageError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ReplyArgs {
    /// Document id or URL.
    pub doc: String,

    /// Comment to reply to.
    comment_id: String,

    /// Reply text.
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResult {
    pub comment_id: String,
    pub reply_id: Option<String>,
    pub status: String,
}

pub fn run(args: ReplyArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    if args.text.trim().is_empty() {
        return Err(UsageError::new("reply text must not be empty").into());
    }
    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    let reply = session.block_on(client.create_reply(&doc_id, &args.comment_id, Some(&args.text), None))?;
    let version = super::current_version(session, &doc_id)?;

    let result = ReplyResult {
        comment_id: args.comment_id.clone(),
        reply_id: reply.id,
        status: "created".into(),
    };
    output::print_output(session.format, &result, format_human)?;

    let update = StateUpdate::new(InteractionKind::Write)
        .with_version(Some(version))
        .with_patch(CommentPatch::replied(args.comment_id));
    session.finish(interaction, update)
}

fn format_human(result: &ReplyResult) -> String {
    format!("OK reply on #{}\n", result.comment_id)
}
