// CLI subcommand dispatch.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};

use gdoc_common::doc_id::extract_doc_id;
use gdoc_core::Fetcher;

use crate::exit_code::{ExitCode, UsageError};
use crate::session::Session;

pub mod cat;
pub mod comment;
pub mod comment_info;
pub mod comments;
pub mod delete_comment;
pub mod diff;
pub mod edit;
pub mod info;
pub mod reopen;
pub mod reply;
pub mod resolve;
pub mod write;

#[derive(Subcommand)]
pub enum Command {
    /// Export document content (markdown by default)
    Cat(cat::CatArgs),
    /// Show document metadata
    Info(info::InfoArgs),
    /// Find and replace text in a document
    Edit(edit::EditArgs),
    /// Overwrite document content from a local markdown file
    Write(write::WriteArgs),
    /// Compare document content with a local file
    Diff(diff::DiffArgs),
    /// List comments on a document
    Comments(comments::CommentsArgs),
    /// Add a comment
    Comment(comment::CommentArgs),
    /// Reply to a comment
    Reply(reply::ReplyArgs),
    /// Resolve a comment
    Resolve(resolve::ResolveArgs),
    /// Reopen a resolved comment
    Reopen(reopen::ReopenArgs),
    /// Delete a comment
    DeleteComment(delete_comment::DeleteCommentArgs),
    /// Show a single comment with its replies
    CommentInfo(comment_info::CommentInfoArgs),
}

/// Run one command. Most report failure only through an error; `diff` also
/// signals differing content through its exit status.
pub fn run(cmd: Command, session: &Session) -> anyhow::Result<ExitCode> {
    match cmd {
        Command::Cat(args) => cat::run(args, session)?,
        Command::Info(args) => info::run(args, session)?,
        Command::Edit(args) => edit::run(args, session)?,
        Command::Write(args) => write::run(args, session)?,
        Command::Diff(args) => return diff::run(args, session),
        Command::Comments(args) => comments::run(args, session)?,
        Command::Comment(args) => comment::run(args, session)?,
        Command::Reply(args) => reply::run(args, session)?,
        Command::Resolve(args) => resolve::run(args, session)?,
        Command::Reopen(args) => reopen::run(args, session)?,
        Command::DeleteComment(args) => delete_comment::run(args, session)?,
        Command::CommentInfo(args) => comment_info::run(args, session)?,
    }
    Ok(ExitCode::Success)
}

/// Bare id or any Docs/Drive URL to a document id.
fn resolve_doc(input: &str) -> anyhow::Result<String> {
    Ok(extract_doc_id(input)?)
}

/// Outcome of a comment mutation, keyed by comment id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentStatus {
    pub id: String,
    pub status: String,
}

impl CommentStatus {
    fn new(id: impl Into<String>, status: &str) -> Self {
        Self { id: id.into(), status: status.to_string() }
    }
}

/// Fresh revision counter. Exports and comment calls do not report one.
fn current_version(session: &Session, doc_id: &str) -> anyhow::Result<i64> {
    let client = session.client()?;
    Ok(session.block_on(client.fetch_revision(doc_id))?.version)
}

/// Read a local input file. Missing or unreadable files are usage errors.
fn read_local_file(path: &Path) -> Result<String, UsageError> {
    if !path.is_file() {
        return Err(UsageError::new(format!("file not found: {}", path.display())));
    }
    std::fs::read_to_string(path)
        .map_err(|error| UsageError::new(format!("cannot read file: {error}")))
}

/// `YYYY-MM-DD`, or empty when unknown.
fn date_only(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Full RFC 3339 timestamp, or empty when unknown.
fn full_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)).unwrap_or_default()
}
