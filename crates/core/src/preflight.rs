// Pre-flight change detection.
//
// Before a command runs, two read-only calls (revision metadata, comment listing)
// are diffed against the cached DocumentState to report what other actors did
// since the last interaction.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use gdoc_common::error::RemoteError;
use gdoc_common::types::{author_label, Comment, ReplyAction};
use serde::Serialize;
use tracing::debug;

use crate::conflict::ConflictDetail;
use crate::fetcher::{CommentQuery, Fetcher};
use crate::state::DocumentState;

const SNIPPET_MAX_CHARS: usize = 60;

/// One line of comment activity: which comment, who, and what they said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub comment_id: String,
    pub author: String,
    pub snippet: String,
}

/// The outcome of one pre-flight. Not persisted, but the only source of values
/// written back into DocumentState after the command succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub is_first_interaction: bool,
    pub doc_title: Option<String>,
    pub doc_owner: Option<String>,
    pub doc_modified: Option<DateTime<Utc>>,
    pub open_comment_count: usize,
    pub resolved_comment_count: usize,

    pub doc_edited: bool,
    pub version_from: Option<i64>,
    pub version_to: Option<i64>,
    pub editor: Option<String>,

    pub new_comments: Vec<ActivityItem>,
    pub new_replies: Vec<ActivityItem>,
    pub resolved_comments: Vec<ActivityItem>,
    pub reopened_comments: Vec<ActivityItem>,

    pub has_conflict: bool,
    pub last_read_version: Option<i64>,
    pub current_version: i64,
    pub preflight_timestamp: DateTime<Utc>,
    /// `last_seen` of the stored record, for "N min ago" rendering.
    pub previous_seen: Option<DateTime<Utc>>,
    pub all_comment_ids: BTreeSet<String>,
    pub all_resolved_ids: BTreeSet<String>,
}

impl ChangeReport {
    pub fn has_changes(&self) -> bool {
        self.doc_edited
            || !self.new_comments.is_empty()
            || !self.new_replies.is_empty()
            || !self.resolved_comments.is_empty()
            || !self.reopened_comments.is_empty()
    }

    pub fn conflict_detail(&self) -> ConflictDetail {
        ConflictDetail {
            read_version: self.last_read_version,
            current_version: self.current_version,
        }
    }
}

pub async fn pre_flight<F: Fetcher>(
    fetcher: &F,
    doc_id: &str,
    state: &DocumentState,
    quiet: bool,
) -> Result<Option<ChangeReport>, RemoteError> {
    pre_flight_with_clock(fetcher, doc_id, state, quiet, Utc::now).await
}

/// Same as [`pre_flight`] with an injectable clock. The clock is read exactly
/// once, before any remote call.
pub async fn pre_flight_with_clock<F, C>(
    fetcher: &F,
    doc_id: &str,
    state: &DocumentState,
    quiet: bool,
    clock: C,
) -> Result<Option<ChangeReport>, RemoteError>
where
    F: Fetcher,
    C: FnOnce() -> DateTime<Utc>,
{
    if quiet {
        return Ok(None);
    }

    let preflight_timestamp = clock();

    let revision = fetcher.fetch_revision(doc_id).await?;
    let since = state.last_comment_check;
    let comments = fetcher.fetch_comments(doc_id, &CommentQuery::since(since)).await?;
    debug!(
        doc_id,
        version = revision.version,
        comments = comments.len(),
        incremental = since.is_some(),
        "pre-flight fetched remote state"
    );

    let current_version = revision.version;
    let conflict = ConflictDetail { read_version: state.last_read_version, current_version };
    let mut report = ChangeReport {
        is_first_interaction: state.is_first_interaction(),
        doc_title: None,
        doc_owner: None,
        doc_modified: None,
        open_comment_count: 0,
        resolved_comment_count: 0,
        doc_edited: false,
        version_from: None,
        version_to: None,
        editor: None,
        new_comments: Vec::new(),
        new_replies: Vec::new(),
        resolved_comments: Vec::new(),
        reopened_comments: Vec::new(),
        has_conflict: conflict.has_conflict(),
        last_read_version: state.last_read_version,
        current_version,
        preflight_timestamp,
        previous_seen: state.last_seen,
        all_comment_ids: state.known_comment_ids.clone(),
        all_resolved_ids: state.known_resolved_ids.clone(),
    };

    for comment in &comments {
        report.all_comment_ids.insert(comment.id.clone());
        if comment.resolved {
            report.all_resolved_ids.insert(comment.id.clone());
        } else {
            report.all_resolved_ids.remove(&comment.id);
        }
    }

    match since {
        None => {
            report.doc_title = revision.name.clone();
            report.doc_owner = revision.owner().map(str::to_string);
            report.doc_modified = revision.modified_time;
            report.resolved_comment_count = comments.iter().filter(|c| c.resolved).count();
            report.open_comment_count = comments.len() - report.resolved_comment_count;
        }
        Some(since) => {
            if let Some(previous) = state.last_version.filter(|v| *v != current_version) {
                report.doc_edited = true;
                report.version_from = Some(previous);
                report.version_to = Some(current_version);
                report.editor = revision.editor().map(str::to_string);
            }
            classify_comments(&mut report, state, &comments, since);
        }
    }

    Ok(Some(report))
}

fn classify_comments(
    report: &mut ChangeReport,
    state: &DocumentState,
    comments: &[Comment],
    since: DateTime<Utc>,
) {
    for comment in comments {
        if !state.known_comment_ids.contains(&comment.id) {
            report.new_comments.push(ActivityItem {
                comment_id: comment.id.clone(),
                author: comment.author_label().to_string(),
                snippet: snippet(&comment.content),
            });
            continue;
        }

        let newest_reply = comment
            .content_replies()
            .filter(|reply| reply.created_time.is_some_and(|created| created > since))
            .last();
        if let Some(reply) = newest_reply {
            report.new_replies.push(ActivityItem {
                comment_id: comment.id.clone(),
                author: author_label(reply.author.as_ref()).to_string(),
                snippet: snippet(&reply.content),
            });
        }

        let was_resolved = state.known_resolved_ids.contains(&comment.id);
        if comment.resolved && !was_resolved {
            report.resolved_comments.push(action_item(comment, ReplyAction::Resolve));
        } else if !comment.resolved && was_resolved {
            report.reopened_comments.push(action_item(comment, ReplyAction::Reopen));
        }
    }
}

fn action_item(comment: &Comment, action: ReplyAction) -> ActivityItem {
    let reply = comment.last_action(action);
    ActivityItem {
        comment_id: comment.id.clone(),
        author: author_label(reply.and_then(|r| r.author.as_ref())).to_string(),
        snippet: snippet(&comment.content),
    }
}

/// Re-check only the revision counter. Used for destructive writes when the full
/// pre-flight was skipped.
pub async fn probe_conflict<F: Fetcher>(
    fetcher: &F,
    doc_id: &str,
    state: &DocumentState,
) -> Result<ConflictDetail, RemoteError> {
    let revision = fetcher.fetch_revision(doc_id).await?;
    Ok(ConflictDetail { read_version: state.last_read_version, current_version: revision.version })
}

/// Truncate to 60 characters, ending in `...` when cut.
pub fn snippet(content: &str) -> String {
    if content.chars().count() <= SNIPPET_MAX_CHARS {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(SNIPPET_MAX_CHARS - 3).collect();
    cut.push_str("...");
    cut
}
