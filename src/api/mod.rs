use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth::BearerToken;
use crate::config::{Config, Resources};
use crate::model::{ResourceId, ResourceKind};

pub mod model;

pub use model::{FormPart, SubmitOutcome, UpdateForm, UpdateReply};

const USER_AGENT: &str = "catalog-admin/0.1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("no bearer token is stored; sign in first")]
    MissingCredential,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("failed to build multipart body: {0}")]
    Multipart(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// The remote catalog as seen by the console. Bodies come back as raw JSON;
/// typed extraction happens in [`model`].
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch_collection(&self, kind: ResourceKind) -> Result<Value, ApiError>;

    async fn fetch_record(&self, kind: ResourceKind, id: ResourceId) -> Result<Value, ApiError>;

    /// A reply with a decodable `{ code, msg }` body is `Ok` whatever the
    /// HTTP status; interpreting `code` is the caller's job.
    async fn update_record(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        form: UpdateForm,
    ) -> Result<UpdateReply, ApiError>;
}

#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
    token: Option<BearerToken>,
    resources: Resources,
}

impl fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    pub fn from_config(cfg: &Config, token: Option<BearerToken>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&cfg.api.base_url)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {e}", cfg.api.base_url)))?;
        Self::with_base_url(base_url, token, cfg.resources.clone())
    }

    pub fn with_base_url(
        base_url: Url,
        token: Option<BearerToken>,
        resources: Resources,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            token,
            resources,
        })
    }

    fn endpoint(&self, path: &str, id: Option<ResourceId>) -> Result<Url, ApiError> {
        let path = match id {
            Some(id) => path.replace("{id}", &id.to_string()),
            None => path.to_string(),
        };
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidEndpoint(format!("{path}: {e}")))
    }

    fn authorized(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder, ApiError> {
        let token = self.token.as_ref().ok_or(ApiError::MissingCredential)?;
        Ok(self
            .http
            .request(method, url)
            .header("Authorization", token.header_value())
            .header("Accept", "application/json"))
    }

    pub fn build_list_request(&self, kind: ResourceKind) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint(&self.resources.get(kind).list, None)?;
        Ok(self.authorized(Method::GET, url)?.build()?)
    }

    pub fn build_fetch_request(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint(&self.resources.get(kind).fetch, Some(id))?;
        Ok(self.authorized(Method::GET, url)?.build()?)
    }

    pub fn build_update_request(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        form: UpdateForm,
    ) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint(&self.resources.get(kind).update, Some(id))?;
        let builder = self.authorized(Method::POST, url)?;
        Ok(builder.multipart(form.into_multipart()?).build()?)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<(u16, String), ApiError> {
        debug!(method = %request.method(), url = %request.url(), "catalog request");
        let res = self.http.execute(request).await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        debug!(status, len = body.len(), "catalog response");
        Ok((status, body))
    }

    async fn execute_json(&self, request: reqwest::Request) -> Result<Value, ApiError> {
        let (status, body) = self.execute(request).await?;
        if !(200..300).contains(&status) {
            warn!(status, %body, "catalog request failed");
            return Err(ApiError::Status { status, body });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

fn log_missing_credential(err: &ApiError, kind: ResourceKind) {
    if matches!(err, ApiError::MissingCredential) {
        warn!(%kind, "no bearer token available; skipping request");
    }
}

#[async_trait]
impl CatalogService for CatalogClient {
    #[instrument(skip_all, fields(%kind))]
    async fn fetch_collection(&self, kind: ResourceKind) -> Result<Value, ApiError> {
        let request = self
            .build_list_request(kind)
            .inspect_err(|e| log_missing_credential(e, kind))?;
        self.execute_json(request).await
    }

    #[instrument(skip_all, fields(%kind, %id))]
    async fn fetch_record(&self, kind: ResourceKind, id: ResourceId) -> Result<Value, ApiError> {
        let request = self
            .build_fetch_request(kind, id)
            .inspect_err(|e| log_missing_credential(e, kind))?;
        self.execute_json(request).await
    }

    #[instrument(skip_all, fields(%kind, %id))]
    async fn update_record(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        form: UpdateForm,
    ) -> Result<UpdateReply, ApiError> {
        let request = self
            .build_update_request(kind, id, form)
            .inspect_err(|e| log_missing_credential(e, kind))?;
        let (status, body) = self.execute(request).await?;
        match serde_json::from_str::<UpdateReply>(&body) {
            Ok(reply) => {
                info!(status, code = reply.code, "update reply");
                Ok(reply)
            }
            Err(_) if !(200..300).contains(&status) => {
                warn!(status, %body, "update failed without a structured reply");
                Err(ApiError::Status { status, body })
            }
            Err(e) => Err(ApiError::InvalidResponse(e.to_string())),
        }
    }
}
