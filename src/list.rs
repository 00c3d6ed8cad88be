//! Collection screen: one fetch per mount, rendered as numbered rows.
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument};

use crate::api::model::extract_collection;
use crate::context::ConsoleContext;
use crate::error::ConsoleError;
use crate::image::{CacheStamp, RemoteImage};
use crate::lifecycle::{Lifecycle, RequestState, Settled};
use crate::model::{Resource, ResourceId};
use crate::routes::Route;

/// One table row. `serial` is 1-based and follows server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow<R> {
    pub serial: usize,
    pub record: R,
    pub thumbnail: RemoteImage,
    /// `None` when the server sent the record without an id.
    pub edit: Option<Route>,
}

struct ListState<R> {
    request: RequestState,
    records: Vec<R>,
    error: Option<ConsoleError>,
}

pub struct ResourceListController<R: Resource> {
    ctx: ConsoleContext,
    lifecycle: Lifecycle,
    stamp: CacheStamp,
    state: Mutex<ListState<R>>,
}

impl<R: Resource> ResourceListController<R> {
    pub fn new(ctx: ConsoleContext) -> Self {
        Self {
            ctx,
            lifecycle: Lifecycle::new(),
            stamp: CacheStamp::now(),
            state: Mutex::new(ListState {
                request: RequestState::NotStarted,
                records: Vec::new(),
                error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ListState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Fetch the collection. Only the first call per mount does anything;
    /// a fresh controller is needed to fetch again.
    #[instrument(skip_all, fields(kind = R::KIND.as_str()))]
    pub async fn activate(&self) {
        {
            let mut st = self.state();
            if st.request != RequestState::NotStarted {
                debug!("list already activated");
                return;
            }
            st.request = RequestState::InFlight;
        }

        let Some(result) = self
            .lifecycle
            .guard(self.ctx.service.fetch_collection(R::KIND))
            .await
        else {
            debug!("list torn down before the collection arrived");
            self.state().request = RequestState::Abandoned;
            return;
        };

        let mut st = self.state();
        match result.and_then(extract_collection::<R>) {
            Ok(records) => {
                info!(count = records.len(), "collection loaded");
                st.records = records;
                st.request = RequestState::Settled(Settled::Success);
            }
            Err(source) => {
                error!(error = %source, "failed to fetch collection");
                st.records.clear();
                st.request = RequestState::Settled(Settled::Failure);
                st.error = Some(ConsoleError::FetchFailure {
                    kind: R::KIND,
                    source,
                });
            }
        }
    }

    pub fn request_state(&self) -> RequestState {
        self.state().request
    }

    pub fn loading(&self) -> bool {
        self.state().request.is_in_flight()
    }

    pub fn records(&self) -> Vec<R> {
        self.state().records.clone()
    }

    pub fn error(&self) -> Option<ConsoleError> {
        self.state().error.clone()
    }

    pub fn rows(&self) -> Vec<ListRow<R>> {
        let settings = self.ctx.settings(R::KIND);
        self.state()
            .records
            .iter()
            .enumerate()
            .map(|(idx, record)| ListRow {
                serial: idx + 1,
                thumbnail: self.ctx.images.resolve(
                    &settings.image_dir,
                    settings.busts_cache,
                    record.image(),
                    self.stamp,
                ),
                edit: record.id().map(|id| self.edit_route(id)),
                record: record.clone(),
            })
            .collect()
    }

    pub fn edit_route(&self, id: ResourceId) -> Route {
        Route::Edit(R::KIND, self.ctx.codec.encode(id))
    }

    pub fn open_edit(&self, id: ResourceId) {
        self.ctx.navigator.navigate(self.edit_route(id));
    }

    pub fn open_create(&self) {
        self.ctx.navigator.navigate(Route::Create(R::KIND));
    }
}
