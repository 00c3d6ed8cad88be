//! Bearer credential read from the persisted token store.
//!
//! The store itself (login, refresh, logout) belongs to the authentication
//! flow; the console only reads whatever token is there.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TOKEN_ENV: &str = "CATALOG_ADMIN_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl BearerToken {
    /// Rejects empty tokens and anything that could not travel in an
    /// `Authorization` header.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim();
        if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Expand a leading `~/` to `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the credential: the environment variable wins over the token file.
/// Returns `None` when nothing usable is stored; callers fail fast on use.
pub fn load_token(token_file: &str) -> Option<BearerToken> {
    if let Ok(raw) = std::env::var(TOKEN_ENV) {
        match BearerToken::parse(&raw) {
            Some(token) => return Some(token),
            None => warn!(env = TOKEN_ENV, "ignoring invalid bearer token from environment"),
        }
    }
    read_token_file(&expand_home(token_file))
}

pub fn read_token_file(path: &Path) -> Option<BearerToken> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(?err, path = %path.display(), "no stored bearer token");
            return None;
        }
    };
    let token = BearerToken::parse(&raw);
    if token.is_none() {
        warn!(path = %path.display(), "stored bearer token is empty or malformed");
    }
    token
}
