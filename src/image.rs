//! Display URLs for stored images.
use std::fmt;

use crate::config::Images;

/// Freshness token appended to cache-busted image URLs. One stamp is taken
/// per screen instance, so re-renders reuse the same URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStamp(i64);

impl CacheStamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn fixed(millis: i64) -> Self {
        Self(millis)
    }
}

impl fmt::Display for CacheStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLoadState {
    Pending,
    Resolved,
    /// Terminal: the placeholder is shown and no further retries happen.
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    url: String,
    placeholder_url: String,
    state: ImageLoadState,
}

impl RemoteImage {
    /// The URL that should be displayed right now.
    pub fn display_url(&self) -> &str {
        match self.state {
            ImageLoadState::Broken => &self.placeholder_url,
            _ => &self.url,
        }
    }

    pub fn state(&self) -> ImageLoadState {
        self.state
    }

    pub fn is_placeholder(&self) -> bool {
        self.display_url() == self.placeholder_url
    }

    pub fn mark_loaded(&mut self) {
        if self.state == ImageLoadState::Pending {
            self.state = ImageLoadState::Resolved;
        }
    }

    /// Swap a pending image to the placeholder. Resolved images stay
    /// resolved and broken ones stay broken.
    pub fn mark_failed(&mut self) {
        if self.state == ImageLoadState::Pending {
            self.state = ImageLoadState::Broken;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    base_url: String,
    placeholder_url: String,
}

impl ImageResolver {
    pub fn new(base_url: impl Into<String>, placeholder_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            placeholder_url: placeholder_url.into(),
        }
    }

    pub fn from_config(cfg: &Images) -> Self {
        Self::new(cfg.base_url.clone(), cfg.placeholder_url.clone())
    }

    pub fn placeholder_url(&self) -> &str {
        &self.placeholder_url
    }

    /// Map a stored file reference to something displayable. A missing or
    /// blank reference resolves to the placeholder immediately.
    pub fn resolve(
        &self,
        image_dir: &str,
        busts_cache: bool,
        reference: Option<&str>,
        stamp: CacheStamp,
    ) -> RemoteImage {
        let reference = reference.map(str::trim).filter(|r| !r.is_empty());
        let Some(reference) = reference else {
            return RemoteImage {
                url: self.placeholder_url.clone(),
                placeholder_url: self.placeholder_url.clone(),
                state: ImageLoadState::Resolved,
            };
        };

        let mut url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            image_dir.trim_matches('/'),
            urlencoding::encode(reference)
        );
        if busts_cache {
            url.push_str(&format!("?t={stamp}"));
        }
        RemoteImage {
            url,
            placeholder_url: self.placeholder_url.clone(),
            state: ImageLoadState::Pending,
        }
    }
}
