// HTTP client for the Drive v3 and Docs v1 APIs.
//
// Implements the read-only `Fetcher` capability used by pre-flight plus the
// export and mutation calls the command handlers need.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use gdoc_common::error::RemoteError;
use gdoc_common::types::{Comment, CommentPage, FileInfo, Reply, ReplyAction, RevisionInfo};
use gdoc_core::{CommentQuery, Fetcher};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;

const AUTHOR_FIELDS: &str = "author(displayName, emailAddress)";
const REVISION_FIELDS: &str = "version, modifiedTime, lastModifyingUser(displayName, emailAddress), \
     name, owners(displayName, emailAddress)";
const FILE_INFO_FIELDS: &str = "id, name, mimeType, modifiedTime, createdTime, \
     owners(displayName, emailAddress), lastModifyingUser(displayName, emailAddress), size, version";
const EXPORT_REFUSAL: &str = "Export only supports Docs Editors files";

/// Export formats offered by `files.export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    PlainText,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::PlainText => "text/plain",
        }
    }
}

pub struct DriveClient {
    http: reqwest::Client,
    token: String,
    api: ApiConfig,
}

impl DriveClient {
    pub fn new(token: String, api: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { http, token, api: api.clone() })
    }

    // ── Files ──────────────────────────────────────────────────────

    pub async fn file_info(&self, doc_id: &str) -> Result<FileInfo, RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id])?;
        let request = self
            .request(Method::GET, url)
            .query(&[("fields", FILE_INFO_FIELDS), ("supportsAllDrives", "true")]);
        decode(&self.send(request, doc_id, false).await?)
    }

    /// Export the document body in the given format.
    pub async fn export(&self, doc_id: &str, format: ExportFormat) -> Result<String, RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id, "export"])?;
        let request = self.request(Method::GET, url).query(&[("mimeType", format.mime_type())]);
        self.send(request, doc_id, true).await
    }

    /// Replace the whole document body with `content` (imported as markdown).
    /// Returns the post-write revision counter when the service reports one.
    pub async fn update_content(
        &self,
        doc_id: &str,
        content: String,
    ) -> Result<Option<i64>, RemoteError> {
        let url = endpoint(&self.api.upload_base_url, &["files", doc_id])?;
        let request = self
            .request(Method::PATCH, url)
            .query(&[
                ("uploadType", "media"),
                ("fields", "id, version"),
                ("supportsAllDrives", "true"),
            ])
            .header(reqwest::header::CONTENT_TYPE, ExportFormat::Markdown.mime_type())
            .body(content);
        let info: FileInfo = decode(&self.send(request, doc_id, false).await?)?;
        Ok(info.version)
    }

    // ── Docs ───────────────────────────────────────────────────────

    /// `replaceAllText` through a Docs batch update. Returns occurrences changed.
    pub async fn replace_all_text(
        &self,
        doc_id: &str,
        old_text: &str,
        new_text: &str,
        match_case: bool,
    ) -> Result<u64, RemoteError> {
        let url = endpoint(&self.api.docs_base_url, &["documents", &format!("{doc_id}:batchUpdate")])?;
        let body = json!({
            "requests": [{
                "replaceAllText": {
                    "containsText": { "text": old_text, "matchCase": match_case },
                    "replaceText": new_text,
                }
            }]
        });
        let request = self.request(Method::POST, url).json(&body);
        let response: BatchUpdateResponse = decode(&self.send(request, doc_id, false).await?)?;
        Ok(response.occurrences_changed())
    }

    // ── Comments ───────────────────────────────────────────────────

    /// Start a thread. `quote` anchors it to a verbatim excerpt of the body.
    pub async fn create_comment(
        &self,
        doc_id: &str,
        content: &str,
        quote: Option<&str>,
    ) -> Result<Comment, RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id, "comments"])?;
        let fields =
            format!("id, content, {AUTHOR_FIELDS}, createdTime, resolved, quotedFileContent(value)");
        let request = self
            .request(Method::POST, url)
            .query(&[("fields", fields.as_str())])
            .json(&new_comment_body(content, quote));
        decode(&self.send(request, doc_id, false).await?)
    }

    /// Post a reply. `action` resolves or reopens the thread; `content` may be
    /// empty only when an action is given.
    pub async fn create_reply(
        &self,
        doc_id: &str,
        comment_id: &str,
        content: Option<&str>,
        action: Option<ReplyAction>,
    ) -> Result<Reply, RemoteError> {
        let url = endpoint(
            &self.api.drive_base_url,
            &["files", doc_id, "comments", comment_id, "replies"],
        )?;
        let fields = format!("id, content, action, {AUTHOR_FIELDS}, createdTime");
        let mut body = serde_json::Map::new();
        if let Some(content) = content.filter(|c| !c.is_empty()) {
            body.insert("content".into(), json!(content));
        }
        if let Some(action) = action {
            body.insert("action".into(), json!(action.as_str()));
        }
        let request = self
            .request(Method::POST, url)
            .query(&[("fields", fields.as_str())])
            .json(&body);
        decode(&self.send(request, doc_id, false).await?)
    }

    pub async fn delete_comment(&self, doc_id: &str, comment_id: &str) -> Result<(), RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id, "comments", comment_id])?;
        self.send(self.request(Method::DELETE, url), doc_id, false).await?;
        Ok(())
    }

    pub async fn get_comment(&self, doc_id: &str, comment_id: &str) -> Result<Comment, RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id, "comments", comment_id])?;
        let request = self
            .request(Method::GET, url)
            .query(&[("fields", comment_fields(true).as_str())]);
        decode(&self.send(request, doc_id, false).await?)
    }

    // ── Transport ──────────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, path = url.path(), "drive api request");
        self.http.request(method, url).bearer_auth(&self.token)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        subject: &str,
        export: bool,
    ) -> Result<String, RemoteError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "drive api request failed");
            return Err(map_status(status.as_u16(), &body, subject, export));
        }
        Ok(body)
    }
}

impl Fetcher for DriveClient {
    async fn fetch_revision(&self, doc_id: &str) -> Result<RevisionInfo, RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id])?;
        let request = self
            .request(Method::GET, url)
            .query(&[("fields", REVISION_FIELDS), ("supportsAllDrives", "true")]);
        decode(&self.send(request, doc_id, false).await?)
    }

    async fn fetch_comment_page(
        &self,
        doc_id: &str,
        query: &CommentQuery,
        page_token: Option<&str>,
    ) -> Result<CommentPage, RemoteError> {
        let url = endpoint(&self.api.drive_base_url, &["files", doc_id, "comments"])?;
        let params = comment_list_params(query, self.api.page_size, page_token);
        let request = self.request(Method::GET, url).query(&params);
        let mut page: CommentPage = decode(&self.send(request, doc_id, false).await?)?;
        if !query.include_resolved {
            page.comments.retain(|comment| !comment.resolved);
        }
        Ok(page)
    }
}

#[derive(Debug, Default, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<serde_json::Value>,
}

impl BatchUpdateResponse {
    fn occurrences_changed(&self) -> u64 {
        self.replies
            .first()
            .and_then(|reply| reply["replaceAllText"]["occurrencesChanged"].as_u64())
            .unwrap_or(0)
    }
}

fn comment_fields(include_anchor: bool) -> String {
    let anchor = if include_anchor { "quotedFileContent(value), " } else { "" };
    format!(
        "id, content, {AUTHOR_FIELDS}, resolved, createdTime, modifiedTime, {anchor}\
         replies(id, {AUTHOR_FIELDS}, createdTime, modifiedTime, content, action)"
    )
}

/// Query parameters for one `comments.list` page. The lower bound is omitted
/// entirely when `query.since` is unset.
fn comment_list_params(
    query: &CommentQuery,
    page_size: u32,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("fields", format!("nextPageToken, comments({})", comment_fields(query.include_anchor))),
        ("pageSize", page_size.to_string()),
        ("includeDeleted", "false".to_string()),
    ];
    if let Some(since) = query.since {
        params.push(("startModifiedTime", format_timestamp(since)));
    }
    if let Some(token) = page_token {
        params.push(("pageToken", token.to_string()));
    }
    params
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = Url::parse(base)
        .map_err(|error| RemoteError::Transport(format!("invalid API base URL `{base}`: {error}")))?;
    url.path_segments_mut()
        .map_err(|_| RemoteError::Transport(format!("API base URL `{base}` cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn new_comment_body(content: &str, quote: Option<&str>) -> serde_json::Value {
    let mut body = json!({ "content": content });
    if let Some(quote) = quote.filter(|q| !q.is_empty()) {
        body["quotedFileContent"] = json!({ "mimeType": "text/plain", "value": quote });
    }
    body
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|error| RemoteError::Decode(error.to_string()))
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    RemoteError::Transport(error.to_string())
}

/// Translate a non-2xx response into a typed failure.
fn map_status(status: u16, body: &str, subject: &str, export: bool) -> RemoteError {
    let message = error_message(body).unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("unknown error")
            .to_string()
    });
    match status {
        401 => RemoteError::auth_expired(),
        403 if export && message.contains(EXPORT_REFUSAL) => RemoteError::NotEditorDocument,
        403 => RemoteError::PermissionDenied(subject.to_string()),
        404 => RemoteError::NotFound(subject.to_string()),
        _ => RemoteError::Api { status, message },
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}
