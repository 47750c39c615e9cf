// Document id extraction from bare ids and Docs/Drive URLs.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocIdError {
    #[error("document id must not be empty")]
    Empty,
    #[error("cannot extract a document id from `{0}`")]
    Unrecognized(String),
}

/// True when `candidate` is usable as a bare document id (and as a state file stem).
pub fn is_bare_doc_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract the document id from a bare id or any of the URL shapes Docs and Drive hand out:
/// `.../d/<id>/...`, `...?id=<id>`, and `.../folders/<id>`.
pub fn extract_doc_id(input: &str) -> Result<String, DocIdError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DocIdError::Empty);
    }
    if is_bare_doc_id(input) {
        return Ok(input.to_string());
    }

    let parsed = Url::parse(input).or_else(|_| Url::parse(&format!("https://{input}")));
    if let Ok(url) = parsed {
        if let Some(id) = id_from_url(&url) {
            return Ok(id);
        }
    }
    Err(DocIdError::Unrecognized(input.to_string()))
}

fn id_from_url(url: &Url) -> Option<String> {
    if let Some(segments) = url.path_segments() {
        let segments: Vec<&str> = segments.collect();
        for pair in segments.windows(2) {
            if matches!(pair[0], "d" | "folders") && is_bare_doc_id(pair[1]) {
                return Some(pair[1].to_string());
            }
        }
    }
    url.query_pairs()
        .find(|(key, value)| key == "id" && is_bare_doc_id(value))
        .map(|(_, value)| value.into_owned())
}
