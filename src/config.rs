//! Configuration loader and validator for the catalog console.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::ResourceKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Invalid configuration: resources.{kind}.{field} {problem}")]
    InvalidResource {
        kind: ResourceKind,
        field: &'static str,
        problem: &'static str,
    },
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub api: Api,
    pub images: Images,
    pub codec: Codec,
    pub resources: Resources,
}

/// REST endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    pub token_file: String,
}

/// Where stored images are served from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Images {
    pub base_url: String,
    pub placeholder_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Codec {
    pub secret: String,
}

/// Per-kind endpoint and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resources {
    pub category: ResourceSettings,
    pub notification: ResourceSettings,
    pub slider: ResourceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSettings {
    /// Collection endpoint, relative to `api.base_url`.
    pub list: String,
    /// Single-record endpoint; must contain `{id}`.
    pub fetch: String,
    /// Update endpoint; must contain `{id}`.
    pub update: String,
    /// Subdirectory under `images.base_url`.
    pub image_dir: String,
    /// Append a freshness query to image URLs of this kind.
    pub busts_cache: bool,
    /// Whether the name field may be changed on the edit screen.
    pub name_editable: bool,
}

/// The presentation half of [`ResourceSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub busts_cache: bool,
    pub name_editable: bool,
}

impl ResourceSettings {
    pub fn policy(&self) -> ResourcePolicy {
        ResourcePolicy {
            busts_cache: self.busts_cache,
            name_editable: self.name_editable,
        }
    }
}

impl Resources {
    pub fn get(&self, kind: ResourceKind) -> &ResourceSettings {
        match kind {
            ResourceKind::Category => &self.category,
            ResourceKind::Notification => &self.notification,
            ResourceKind::Slider => &self.slider,
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn is_http_url(raw: &str) -> bool {
    reqwest::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !is_http_url(&cfg.api.base_url) {
        return Err(ConfigError::Invalid("api.base_url must be an http(s) URL"));
    }
    if !cfg.api.base_url.ends_with('/') {
        // Url::join drops the last segment otherwise.
        return Err(ConfigError::Invalid("api.base_url must end with '/'"));
    }
    if cfg.api.token_file.trim().is_empty() {
        return Err(ConfigError::Invalid("api.token_file must be non-empty"));
    }

    if !is_http_url(&cfg.images.base_url) {
        return Err(ConfigError::Invalid("images.base_url must be an http(s) URL"));
    }
    if !is_http_url(&cfg.images.placeholder_url) {
        return Err(ConfigError::Invalid(
            "images.placeholder_url must be an http(s) URL",
        ));
    }

    if cfg.codec.secret.trim().is_empty() {
        return Err(ConfigError::Invalid("codec.secret must be non-empty"));
    }

    for kind in ResourceKind::ALL {
        validate_resource(cfg.resources.get(kind)).map_err(|(field, problem)| {
            ConfigError::InvalidResource {
                kind,
                field,
                problem,
            }
        })?;
    }

    Ok(())
}

const NON_EMPTY: &str = "must be non-empty";
const HAS_ID: &str = "must contain {id}";

/// Returns the first offending field and what is wrong with it.
fn validate_resource(rs: &ResourceSettings) -> Result<(), (&'static str, &'static str)> {
    if rs.list.trim().is_empty() {
        return Err(("list", NON_EMPTY));
    }
    if !rs.fetch.contains("{id}") {
        return Err(("fetch", HAS_ID));
    }
    if !rs.update.contains("{id}") {
        return Err(("update", HAS_ID));
    }
    if rs.image_dir.trim().is_empty() {
        return Err(("image_dir", NON_EMPTY));
    }
    Ok(())
}

/// Returns the sample configuration.
pub fn example() -> &'static str {
    r#"api:
  base_url: "https://kmrlive.in/public/api/"
  token_file: "~/.config/catalog-admin/token"

images:
  base_url: "https://kmrlive.in/storage/app/public"
  placeholder_url: "https://kmrlive.in/storage/app/public/no_image.jpg"

codec:
  secret: "CHANGE_ME"

resources:
  category:
    list: "panel-fetch-category-list"
    fetch: "panel-fetch-category-by-id/{id}"
    update: "panel-update-category/{id}"
    image_dir: "categories_images"
    busts_cache: false
    name_editable: false
  notification:
    list: "panel-fetch-notification-list"
    fetch: "panel-fetch-notification-by-id/{id}"
    update: "panel-update-notification/{id}"
    image_dir: "notification_images"
    busts_cache: true
    name_editable: true
  slider:
    list: "panel-fetch-slider-list"
    fetch: "panel-fetch-slider-by-id/{id}"
    update: "panel-update-slider/{id}"
    image_dir: "slider_images"
    busts_cache: true
    name_editable: true
"#
}
