// Remote data types as returned by the Drive v3 comments and files endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A person attached to a comment, reply, or file revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl Author {
    /// Display label: email first, then display name, then `unknown`.
    pub fn label(&self) -> &str {
        self.email_address
            .as_deref()
            .filter(|email| !email.is_empty())
            .or(self.display_name.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or("unknown")
    }

    /// Label preferring the human display name over the email address.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email_address.as_deref().filter(|email| !email.is_empty()))
            .unwrap_or("unknown")
    }
}

/// Label for an optional author, `unknown` when absent.
pub fn author_label(author: Option<&Author>) -> &str {
    author.map_or("unknown", Author::label)
}

/// Non-content action carried by a reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyAction {
    Resolve,
    Reopen,
}

impl ReplyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Reopen => "reopen",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ReplyAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

impl Reply {
    /// A reply that carries text, as opposed to a bare resolve/reopen action.
    pub fn has_content(&self) -> bool {
        self.action.is_none() && !self.content.is_empty()
    }
}

/// The document excerpt a comment was attached to when it was created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuotedFileContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_file_content: Option<QuotedFileContent>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    /// Anchor excerpt, `None` when the comment is unanchored or the excerpt is empty.
    pub fn anchor(&self) -> Option<&str> {
        self.quoted_file_content
            .as_ref()
            .and_then(|quoted| quoted.value.as_deref())
            .filter(|value| !value.is_empty())
    }

    pub fn author_label(&self) -> &str {
        author_label(self.author.as_ref())
    }

    pub fn status(&self) -> &'static str {
        if self.resolved {
            "resolved"
        } else {
            "open"
        }
    }

    /// Replies that carry text, in thread order.
    pub fn content_replies(&self) -> impl Iterator<Item = &Reply> {
        self.replies.iter().filter(|reply| reply.has_content())
    }

    /// Most recent reply carrying the given action.
    pub fn last_action(&self, action: ReplyAction) -> Option<&Reply> {
        self.replies.iter().rev().find(|reply| reply.action == Some(action))
    }
}

/// One page of a comment listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Lightweight revision facts used by pre-flight change detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modifying_user: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub owners: Vec<Author>,
}

impl RevisionInfo {
    /// Last editor, display name first (banner register).
    pub fn editor(&self) -> Option<&str> {
        self.last_modifying_user.as_ref().map(Author::display_label)
    }

    /// First owner, email first.
    pub fn owner(&self) -> Option<&str> {
        self.owners.first().map(Author::label)
    }
}

/// Full file metadata as shown by `gdoc info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owners: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modifying_user: Option<Author>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub version: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Number(value) => Ok(value),
            Self::String(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected an int64, got `{text}`"))),
        }
    }
}

// Drive encodes int64 fields as JSON strings.
fn deserialize_version<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_i64()
}

fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_i64).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comment_parses_drive_shape() {
        let comment: Comment = serde_json::from_value(json!({
            "id": "AAA",
            "content": "needs a citation",
            "author": { "displayName": "Alice", "emailAddress": "alice@co.com" },
            "resolved": false,
            "createdTime": "2025-06-15T10:00:00.000Z",
            "modifiedTime": "2025-06-15T11:00:00Z",
            "quotedFileContent": { "mimeType": "text/html", "value": "content line" },
            "replies": [
                { "author": { "emailAddress": "bob@co.com" }, "content": "Fixed" },
                { "author": { "displayName": "Bob" }, "content": "", "action": "resolve" }
            ]
        }))
        .unwrap();

        assert_eq!(comment.anchor(), Some("content line"));
        assert_eq!(comment.author_label(), "alice@co.com");
        assert_eq!(comment.content_replies().count(), 1);
        assert_eq!(
            comment.last_action(ReplyAction::Resolve).and_then(|r| r.author.as_ref()).map(Author::label),
            Some("Bob")
        );
    }

    #[test]
    fn empty_quoted_value_is_not_an_anchor() {
        let comment: Comment = serde_json::from_value(json!({
            "id": "c1",
            "quotedFileContent": { "value": "" }
        }))
        .unwrap();
        assert_eq!(comment.anchor(), None);
        assert_eq!(comment.status(), "open");
        assert_eq!(comment.author_label(), "unknown");
    }

    #[test]
    fn revision_version_accepts_string_or_number() {
        let from_string: RevisionInfo =
            serde_json::from_value(json!({ "version": "847" })).unwrap();
        let from_number: RevisionInfo = serde_json::from_value(json!({ "version": 848 })).unwrap();
        assert_eq!(from_string.version, 847);
        assert_eq!(from_number.version, 848);
    }

    #[test]
    fn revision_version_rejects_garbage() {
        let result = serde_json::from_value::<RevisionInfo>(json!({ "version": "v12" }));
        assert!(result.is_err());
    }

    #[test]
    fn revision_labels_editor_and_owner() {
        let revision: RevisionInfo = serde_json::from_value(json!({
            "version": "3",
            "lastModifyingUser": { "displayName": "Carol", "emailAddress": "carol@co.com" },
            "owners": [{ "displayName": "Dan", "emailAddress": "dan@co.com" }]
        }))
        .unwrap();
        assert_eq!(revision.editor(), Some("Carol"));
        assert_eq!(revision.owner(), Some("dan@co.com"));
    }

    #[test]
    fn file_info_optional_numbers() {
        let info: FileInfo = serde_json::from_value(json!({
            "id": "doc1",
            "name": "Plan",
            "size": "1024",
        }))
        .unwrap();
        assert_eq!(info.size, Some(1024));
        assert_eq!(info.version, None);
    }
}
