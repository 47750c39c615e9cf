// Per-document awareness state persisted at `<root>/<doc_id>.json`.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gdoc_common::doc_id::is_bare_doc_id;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::preflight::ChangeReport;
use crate::reconcile::{reconcile, StateUpdate};

const STATE_FILE_EXT: &str = "json";

/// What this client last knew about one document.
///
/// A missing record and an all-empty record mean the same thing: the client has
/// never interacted with the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentState {
    /// Most recent interaction of any kind.
    pub last_seen: Option<DateTime<Utc>>,
    /// Revision counter observed at the most recent interaction.
    pub last_version: Option<i64>,
    /// Revision counter observed at the most recent content read.
    pub last_read_version: Option<i64>,
    /// Lower bound for the next incremental comment fetch.
    pub last_comment_check: Option<DateTime<Utc>>,
    pub known_comment_ids: BTreeSet<String>,
    /// Always a subset of `known_comment_ids`.
    pub known_resolved_ids: BTreeSet<String>,
}

impl DocumentState {
    /// No comment baseline has been established yet.
    pub fn is_first_interaction(&self) -> bool {
        self.last_comment_check.is_none()
    }

    /// Restore `known_resolved_ids ⊆ known_comment_ids`.
    pub fn normalize(&mut self) {
        for id in &self.known_resolved_ids {
            if !self.known_comment_ids.contains(id) {
                self.known_comment_ids.insert(id.clone());
            }
        }
    }
}

/// Stores one JSON record per document under an injectable root directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self, doc_id: &str) -> PathBuf {
        self.root.join(format!("{doc_id}.{STATE_FILE_EXT}"))
    }

    /// Load the record for `doc_id`. Never fails: anything unusable reads as empty.
    pub fn load(&self, doc_id: &str) -> DocumentState {
        if !is_bare_doc_id(doc_id) {
            warn!(doc_id, "refusing to load state for a malformed document id");
            return DocumentState::default();
        }

        let path = self.state_path(doc_id);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return DocumentState::default();
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "state record unreadable; starting fresh");
                return DocumentState::default();
            }
        };

        match serde_json::from_slice::<DocumentState>(&raw) {
            Ok(mut state) => {
                state.normalize();
                state
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "discarding corrupt state record");
                if let Err(error) = fs::remove_file(&path) {
                    debug!(path = %path.display(), %error, "failed to remove corrupt state record");
                }
                DocumentState::default()
            }
        }
    }

    /// Replace the record for `doc_id` atomically (temp file in the same directory, then rename).
    pub fn save(&self, doc_id: &str, state: &DocumentState) -> Result<()> {
        anyhow::ensure!(is_bare_doc_id(doc_id), "invalid document id `{doc_id}`");

        fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create state directory `{}`", self.root.display())
        })?;

        let payload = serde_json::to_vec_pretty(state).context("failed to encode state record")?;
        let target_path = self.state_path(doc_id);
        let tmp_path = self.temp_path_for(doc_id);

        if let Err(error) = write_synced(&tmp_path, &payload) {
            let _ = fs::remove_file(&tmp_path);
            return Err(error);
        }

        if let Err(error) = fs::rename(&tmp_path, &target_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(error).with_context(|| {
                format!(
                    "failed to atomically move state `{}` to `{}`",
                    tmp_path.display(),
                    target_path.display()
                )
            });
        }

        debug!(doc_id, path = %target_path.display(), "saved document state");
        Ok(())
    }

    /// Fold a finished command into the stored record and persist it.
    ///
    /// The record is re-read here rather than reusing the copy loaded before the
    /// command, so a concurrent invocation's comment ids are unioned in.
    pub fn apply_and_save(
        &self,
        doc_id: &str,
        report: Option<&ChangeReport>,
        update: &StateUpdate,
    ) -> Result<DocumentState> {
        let stored = self.load(doc_id);
        let next = reconcile(&stored, report, update, Utc::now());
        self.save(doc_id, &next)?;
        Ok(next)
    }

    fn temp_path_for(&self, doc_id: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        self.root.join(format!(
            "{doc_id}.{STATE_FILE_EXT}.tmp.{}.{nonce}",
            std::process::id()
        ))
    }
}

fn write_synced(path: &Path, payload: &[u8]) -> Result<()> {
    let mut file = open_private_truncate(path)
        .with_context(|| format!("failed to open temp state `{}`", path.display()))?;
    file.write_all(payload).context("failed to write state record")?;
    file.sync_data().context("failed to fsync state record")?;
    Ok(())
}

fn open_private_truncate(path: &Path) -> std::io::Result<std::fs::File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        OpenOptions::new().create(true).write(true).truncate(true).mode(0o600).open(path)
    }
    #[cfg(not(unix))]
    {
        OpenOptions::new().create(true).write(true).truncate(true).open(path)
    }
}
