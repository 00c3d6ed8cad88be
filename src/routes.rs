use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::model::ResourceKind;

/// A console screen. Edit routes carry the opaque identifier token, never a
/// raw id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List(ResourceKind),
    Create(ResourceKind),
    Edit(ResourceKind, String),
}

static ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>/master/category|/notification|/app-update/slider)(?:/(?P<action>add|edit/(?P<token>[^/]+)))?/?$")
        .expect("route regex")
});

impl Route {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Route::List(kind) | Route::Create(kind) | Route::Edit(kind, _) => *kind,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::List(kind) => kind.route_base().to_string(),
            Route::Create(kind) => format!("{}/add", kind.route_base()),
            Route::Edit(kind, token) => {
                format!("{}/edit/{}", kind.route_base(), urlencoding::encode(token))
            }
        }
    }

    /// Inverse of [`Route::path`]. The edit token comes back percent-decoded;
    /// whether it is a valid identifier is for the codec to decide.
    pub fn parse(path: &str) -> Option<Self> {
        let caps = ROUTE_RE.captures(path.trim())?;
        let kind = ResourceKind::ALL
            .into_iter()
            .find(|k| k.route_base() == &caps["base"])?;
        match caps.name("action").map(|m| m.as_str()) {
            None => Some(Route::List(kind)),
            Some("add") => Some(Route::Create(kind)),
            Some(_) => {
                let raw = caps.name("token")?.as_str();
                let token = urlencoding::decode(raw).ok()?.into_owned();
                Some(Route::Edit(kind, token))
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
