// Access-token lookup. The OAuth flow itself lives outside this binary; we only
// pick up a token that something else already minted.

use std::path::Path;

use gdoc_common::error::RemoteError;
use serde::Deserialize;
use tracing::debug;

pub const ACCESS_TOKEN_ENV: &str = "GDOC_ACCESS_TOKEN";
const TOKEN_FILE: &str = "token.json";

#[derive(Debug, Deserialize)]
struct StoredToken {
    #[serde(alias = "access_token")]
    token: Option<String>,
}

/// `$GDOC_ACCESS_TOKEN`, else the `token`/`access_token` field of `<config_dir>/token.json`.
pub fn load_access_token(config_dir: &Path) -> Result<String, RemoteError> {
    if let Some(token) = std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()) {
        debug!("using access token from environment");
        return Ok(token.trim().to_string());
    }
    token_from_file(&config_dir.join(TOKEN_FILE))
}

fn token_from_file(path: &Path) -> Result<String, RemoteError> {
    let not_authenticated = || {
        RemoteError::Auth(format!(
            "Not authenticated. Set {ACCESS_TOKEN_ENV} or store a token in {}.",
            path.display()
        ))
    };

    let raw = std::fs::read_to_string(path).map_err(|_| not_authenticated())?;
    let stored: StoredToken = serde_json::from_str(&raw).map_err(|_| not_authenticated())?;
    stored
        .token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(not_authenticated)
}
