#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, Notify};

use catalog_admin::api::{ApiError, CatalogService, UpdateForm, UpdateReply};
use catalog_admin::config::{self, Config};
use catalog_admin::model::{ResourceId, ResourceKind};
use catalog_admin::notify::{Navigator, Toast, Toaster};
use catalog_admin::routes::Route;
use catalog_admin::ConsoleContext;

pub const SECRET: &str = "CHANGE_ME";

pub fn config() -> Config {
    serde_yaml::from_str(config::example()).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Collection(ResourceKind),
    Record(ResourceKind, ResourceId),
    Update(ResourceKind, ResourceId, UpdateForm),
}

/// Catalog double: queued replies per operation, every call recorded.
/// With a gate installed, each call parks until the test releases it.
#[derive(Clone, Default)]
pub struct RecordingCatalog {
    collections: Arc<Mutex<VecDeque<Result<Value, ApiError>>>>,
    records: Arc<Mutex<VecDeque<Result<Value, ApiError>>>>,
    updates: Arc<Mutex<VecDeque<Result<UpdateReply, ApiError>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    gate: Option<Gate>,
}

#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl RecordingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub async fn push_collection(&self, reply: Result<Value, ApiError>) {
        self.collections.lock().await.push_back(reply);
    }

    pub async fn push_record(&self, reply: Result<Value, ApiError>) {
        self.records.lock().await.push_back(reply);
    }

    pub async fn push_update(&self, reply: Result<UpdateReply, ApiError>) {
        self.updates.lock().await.push_back(reply);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn update_forms(&self) -> Vec<UpdateForm> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(_, _, form) => Some(form),
                _ => None,
            })
            .collect()
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

#[async_trait]
impl CatalogService for RecordingCatalog {
    async fn fetch_collection(&self, kind: ResourceKind) -> Result<Value, ApiError> {
        self.calls.lock().await.push(Call::Collection(kind));
        self.pass_gate().await;
        self.collections
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(serde_json::json!({})))
    }

    async fn fetch_record(&self, kind: ResourceKind, id: ResourceId) -> Result<Value, ApiError> {
        self.calls.lock().await.push(Call::Record(kind, id));
        self.pass_gate().await;
        self.records
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no queued record".into())))
    }

    async fn update_record(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        form: UpdateForm,
    ) -> Result<UpdateReply, ApiError> {
        self.calls.lock().await.push(Call::Update(kind, id, form));
        self.pass_gate().await;
        self.updates.lock().await.pop_front().unwrap_or_else(|| {
            Ok(UpdateReply {
                code: 200,
                msg: None,
            })
        })
    }
}

#[derive(Clone, Default)]
pub struct RecordingToaster {
    toasts: Arc<StdMutex<Vec<Toast>>>,
}

impl RecordingToaster {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Toaster for RecordingToaster {
    fn show(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

#[derive(Clone, Default)]
pub struct RecordingNavigator {
    routes: Arc<StdMutex<Vec<Route>>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

pub struct Harness {
    pub catalog: RecordingCatalog,
    pub toaster: RecordingToaster,
    pub navigator: RecordingNavigator,
    pub ctx: ConsoleContext,
}

impl Harness {
    pub fn new(catalog: RecordingCatalog) -> Self {
        let toaster = RecordingToaster::default();
        let navigator = RecordingNavigator::default();
        let ctx = ConsoleContext::new(
            &config(),
            Arc::new(catalog.clone()),
            Arc::new(toaster.clone()),
            Arc::new(navigator.clone()),
        );
        Self {
            catalog,
            toaster,
            navigator,
            ctx,
        }
    }

    pub fn token(&self, raw: u64) -> String {
        self.ctx.codec.encode(ResourceId::new(raw).unwrap())
    }
}
