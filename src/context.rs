use std::sync::Arc;

use crate::api::{ApiError, CatalogClient, CatalogService};
use crate::auth::BearerToken;
use crate::codec::IdentifierCodec;
use crate::config::{Config, ResourceSettings, Resources};
use crate::image::ImageResolver;
use crate::model::ResourceKind;
use crate::notify::{Navigator, Toaster, TracingNavigator, TracingToaster};

/// Everything a screen needs from the outside, passed in explicitly so that
/// controllers never reach for process-wide state.
#[derive(Clone)]
pub struct ConsoleContext {
    pub service: Arc<dyn CatalogService>,
    pub toaster: Arc<dyn Toaster>,
    pub navigator: Arc<dyn Navigator>,
    pub codec: IdentifierCodec,
    pub images: ImageResolver,
    pub resources: Resources,
}

impl ConsoleContext {
    pub fn new(
        cfg: &Config,
        service: Arc<dyn CatalogService>,
        toaster: Arc<dyn Toaster>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            service,
            toaster,
            navigator,
            codec: IdentifierCodec::new(&cfg.codec.secret),
            images: ImageResolver::from_config(&cfg.images),
            resources: cfg.resources.clone(),
        }
    }

    /// HTTP client plus log-backed notices, for headless use.
    pub fn headless(cfg: &Config, token: Option<BearerToken>) -> Result<Self, ApiError> {
        let client = CatalogClient::from_config(cfg, token)?;
        Ok(Self::new(
            cfg,
            Arc::new(client),
            Arc::new(TracingToaster),
            Arc::new(TracingNavigator),
        ))
    }

    pub fn settings(&self, kind: ResourceKind) -> &ResourceSettings {
        self.resources.get(kind)
    }
}
