// Read-only remote capability consumed by pre-flight.
//
// Abstracted for testability: the CLI plugs in the HTTP client, tests plug in
// scripted fakes that count calls.

use chrono::{DateTime, Utc};
use gdoc_common::error::RemoteError;
use gdoc_common::types::{Comment, CommentPage, RevisionInfo};

/// Filter for a comment listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentQuery {
    /// Lower bound on comment modification time. `None` omits the bound from the
    /// request entirely so the full comment set comes back.
    pub since: Option<DateTime<Utc>>,
    pub include_resolved: bool,
    /// Ask for the quoted anchor excerpt of each comment.
    pub include_anchor: bool,
}

impl CommentQuery {
    pub fn all() -> Self {
        Self { since: None, include_resolved: true, include_anchor: true }
    }

    pub fn since(since: Option<DateTime<Utc>>) -> Self {
        Self { since, include_resolved: true, include_anchor: false }
    }
}

#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Lightweight metadata: revision counter, last edit time, last editor.
    async fn fetch_revision(&self, doc_id: &str) -> Result<RevisionInfo, RemoteError>;

    async fn fetch_comment_page(
        &self,
        doc_id: &str,
        query: &CommentQuery,
        page_token: Option<&str>,
    ) -> Result<CommentPage, RemoteError>;

    /// Every comment matching `query`, following continuation tokens to the end.
    async fn fetch_comments(
        &self,
        doc_id: &str,
        query: &CommentQuery,
    ) -> Result<Vec<Comment>, RemoteError> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.fetch_comment_page(doc_id, query, page_token.as_deref()).await?;
            comments.extend(page.comments);
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    return Err(RemoteError::Decode(format!(
                        "comment listing repeated page token `{next}`"
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(comments)
    }
}
