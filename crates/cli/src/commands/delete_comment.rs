// `gdoc delete-comment`: permanently delete a comment thread.

use std::io::{self, BufRead, IsTerminal, Write};

use clap::Args;

use gdoc_core::{CommandClass, CommentPatch, InteractionKind, StateUpdate};

use super::CommentStatus;
use crate::exit_code::UsageError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct DeleteCommentArgs {
    /// Document id or URL.
    pub doc: String,

    /// Comment to delete.
    comment_id: String,

    /// Skip the confirmation prompt.
    #[arg(long)]
    force: bool,
}

pub fn run(args: DeleteCommentArgs, session: &Session) -> anyhow::Result<()> {
    let doc_id = super::resolve_doc(&args.doc)?;
    if !args.force {
        confirm(&format!("delete comment #{}", args.comment_id))?;
    }

    let interaction = session.begin(&doc_id)?;
    session.check_conflict(&interaction, CommandClass::NoCheck, false)?;

    let client = session.client()?;
    session.block_on(client.delete_comment(&doc_id, &args.comment_id))?;
    let version = super::current_version(session, &doc_id)?;

    let result = CommentStatus::new(&args.comment_id, "deleted");
    output::print_output(session.format, &result, format_human)?;

    let update = StateUpdate::new(InteractionKind::Write)
        .with_version(Some(version))
        .with_patch(CommentPatch::deleted(args.comment_id));
    session.finish(interaction, update)
}

/// Interactive `[y/N]` prompt on stderr. Refuses outright when stdin is not a terminal.
fn confirm(action: &str) -> Result<(), UsageError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(UsageError::new(format!(
            "Refusing to {action} without --force (non-interactive)"
        )));
    }
    eprint!("{action} [y/N]: ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .map_err(|error| UsageError::new(format!("cannot read confirmation: {error}")))?;
    check_answer(action, &answer)
}

fn check_answer(action: &str, answer: &str) -> Result<(), UsageError> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => {
            tracing::debug!(action, "confirmed");
            Ok(())
        }
        _ => Err(UsageError::new("Cancelled")),
    }
}

fn format_human(result: &CommentStatus) -> String {
    format!("OK deleted comment #{}\n", result.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_answers() {
        assert!(check_answer("delete comment #A", "y\n").is_ok());
        assert!(check_answer("delete comment #A", " YES \n").is_ok());
    }

    #[test]
    fn anything_else_cancels() {
        for answer in ["", "\n", "n\n", "nope\n"] {
            let err = check_answer("delete comment #A", answer).unwrap_err();
            assert_eq!(err.to_string(), "Cancelled");
        }
    }

    #[test]
    fn human_output() {
        assert_eq!(
            format_human(&CommentStatus::new("AAA", "deleted")),
            "OK deleted comment #AAA\n"
        );
    }
}
