// Folding a finished command into the stored DocumentState.

use chrono::{DateTime, Utc};

use crate::preflight::ChangeReport;
use crate::state::DocumentState;

/// Comment-set edits implied by a successful comment mutation, taken from the
/// mutation's own response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPatch {
    pub add_comment_id: Option<String>,
    pub add_resolved_id: Option<String>,
    pub remove_resolved_id: Option<String>,
    pub remove_comment_id: Option<String>,
}

impl CommentPatch {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn created(comment_id: impl Into<String>) -> Self {
        Self { add_comment_id: Some(comment_id.into()), ..Self::default() }
    }

    pub fn replied(comment_id: impl Into<String>) -> Self {
        Self::created(comment_id)
    }

    pub fn resolved(comment_id: impl Into<String>) -> Self {
        let id = comment_id.into();
        Self { add_comment_id: Some(id.clone()), add_resolved_id: Some(id), ..Self::default() }
    }

    pub fn reopened(comment_id: impl Into<String>) -> Self {
        let id = comment_id.into();
        Self { add_comment_id: Some(id.clone()), remove_resolved_id: Some(id), ..Self::default() }
    }

    pub fn deleted(comment_id: impl Into<String>) -> Self {
        Self { remove_comment_id: Some(comment_id.into()), ..Self::default() }
    }

    pub fn apply(&self, state: &mut DocumentState) {
        if let Some(id) = &self.add_comment_id {
            state.known_comment_ids.insert(id.clone());
        }
        if let Some(id) = &self.add_resolved_id {
            state.known_comment_ids.insert(id.clone());
            state.known_resolved_ids.insert(id.clone());
        }
        if let Some(id) = &self.remove_resolved_id {
            state.known_resolved_ids.remove(id);
        }
        if let Some(id) = &self.remove_comment_id {
            state.known_comment_ids.remove(id);
            state.known_resolved_ids.remove(id);
        }
    }
}

/// How a command touched the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Content export. Moves the read baseline.
    Read,
    /// Metadata or comment inspection.
    Inspect,
    /// Content or comment mutation.
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub kind: InteractionKind,
    /// Revision counter reported by the command itself, if it learned one.
    pub command_version: Option<i64>,
    pub patch: CommentPatch,
}

impl StateUpdate {
    pub fn new(kind: InteractionKind) -> Self {
        Self { kind, command_version: None, patch: CommentPatch::none() }
    }

    pub fn with_version(mut self, version: Option<i64>) -> Self {
        self.command_version = version;
        self
    }

    pub fn with_patch(mut self, patch: CommentPatch) -> Self {
        self.patch = patch;
        self
    }
}

/// Compute the record to persist after a successful command.
///
/// Without a report (quiet run) the comment sets and `last_comment_check` are
/// carried over unchanged; only the patch touches them.
pub fn reconcile(
    stored: &DocumentState,
    report: Option<&ChangeReport>,
    update: &StateUpdate,
    now: DateTime<Utc>,
) -> DocumentState {
    let mut next = stored.clone();
    next.last_seen = Some(now);

    if let Some(report) = report {
        next.known_comment_ids.extend(report.all_comment_ids.iter().cloned());
        next.known_resolved_ids = report.all_resolved_ids.clone();
        next.last_comment_check = Some(report.preflight_timestamp);
    }

    let observed = update.command_version.or(report.map(|r| r.current_version));
    if let Some(version) = observed {
        next.last_version = Some(version);
        if update.kind == InteractionKind::Read {
            next.last_read_version = Some(version);
        }
    }

    update.patch.apply(&mut next);
    next.normalize();
    next
}
