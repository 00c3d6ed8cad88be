//! Single-record edit screen.
//!
//! ```text
//! Init -> Decoding -> Fetching -> Ready -> Submitting -> Navigated
//!            |            |         ^          |
//!            v            v         +----------+  conflict / transport failure
//!        Malformed   Unavailable
//! ```
//!
//! Teardown while Fetching or Submitting ends in Detached.
//!
//! Every asynchronous step runs under the screen's [`Lifecycle`]; results
//! that arrive after teardown are discarded.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument, warn};

use crate::api::model::extract_record;
use crate::api::{SubmitOutcome, UpdateForm};
use crate::config::ResourcePolicy;
use crate::context::ConsoleContext;
use crate::error::ConsoleError;
use crate::image::{CacheStamp, RemoteImage};
use crate::lifecycle::{Lifecycle, RequestState, Settled};
use crate::model::{FieldError, PendingFile, Resource, ResourceId};
use crate::notify::Toast;
use crate::routes::Route;

pub const SUBMIT_LABEL: &str = "Update";
pub const SUBMITTING_LABEL: &str = "Updating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Init,
    Decoding,
    Fetching,
    Ready,
    Submitting,
    Navigated,
    /// The route token did not decode; nothing was fetched.
    Malformed,
    /// The record could not be fetched; the form is never shown.
    Unavailable,
    /// The screen went away while a request was in flight.
    Detached,
}

struct EditState<R> {
    phase: EditPhase,
    id: Option<ResourceId>,
    form: Option<R>,
    pending_file: Option<PendingFile>,
    image: Option<RemoteImage>,
    fetch: RequestState,
    submit: RequestState,
    error: Option<ConsoleError>,
}

pub struct ResourceEditController<R: Resource> {
    ctx: ConsoleContext,
    lifecycle: Lifecycle,
    route_token: String,
    policy: ResourcePolicy,
    stamp: CacheStamp,
    state: Mutex<EditState<R>>,
}

impl<R: Resource> ResourceEditController<R> {
    /// `route_token` is the edit route's path segment as received, possibly
    /// still percent-encoded.
    pub fn new(ctx: ConsoleContext, route_token: impl Into<String>) -> Self {
        let policy = ctx.settings(R::KIND).policy();
        Self {
            ctx,
            lifecycle: Lifecycle::new(),
            route_token: route_token.into(),
            policy,
            stamp: CacheStamp::now(),
            state: Mutex::new(EditState {
                phase: EditPhase::Init,
                id: None,
                form: None,
                pending_file: None,
                image: None,
                fetch: RequestState::NotStarted,
                submit: RequestState::NotStarted,
                error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn decode_token(&self) -> Result<ResourceId, ConsoleError> {
        let malformed = |source| ConsoleError::MalformedIdentifier {
            kind: R::KIND,
            source,
        };
        let token = urlencoding::decode(&self.route_token)
            .map_err(|e| malformed(crate::codec::CodecError::Alphabet(e.to_string())))?;
        self.ctx.codec.decode(&token).map_err(malformed)
    }

    /// Decode the route token and fetch the record. Runs once per mount.
    #[instrument(skip_all, fields(kind = R::KIND.as_str()))]
    pub async fn mount(&self) {
        let id = {
            let mut st = self.state();
            if st.phase != EditPhase::Init {
                debug!(phase = ?st.phase, "edit screen already mounted");
                return;
            }
            st.phase = EditPhase::Decoding;
            match self.decode_token() {
                Ok(id) => {
                    st.id = Some(id);
                    st.phase = EditPhase::Fetching;
                    st.fetch = RequestState::InFlight;
                    id
                }
                Err(err) => {
                    warn!(error = %err, "refusing to fetch with a malformed identifier");
                    st.phase = EditPhase::Malformed;
                    let toast = Toast::error(err.user_message());
                    st.error = Some(err);
                    drop(st);
                    self.ctx.toaster.show(toast);
                    return;
                }
            }
        };
        debug!(%id, "fetching record");

        let Some(result) = self
            .lifecycle
            .guard(self.ctx.service.fetch_record(R::KIND, id))
            .await
        else {
            debug!("edit screen torn down before the record arrived");
            self.detach(EditPhase::Fetching);
            return;
        };

        let failure = {
            let mut st = self.state();
            match result.and_then(extract_record::<R>) {
                Ok(record) => {
                    let settings = self.ctx.settings(R::KIND);
                    st.image = Some(self.ctx.images.resolve(
                        &settings.image_dir,
                        self.policy.busts_cache,
                        record.image(),
                        self.stamp,
                    ));
                    st.form = Some(record);
                    st.fetch = RequestState::Settled(Settled::Success);
                    st.phase = EditPhase::Ready;
                    None
                }
                Err(source) => {
                    error!(error = %source, "failed to fetch record");
                    let err = ConsoleError::FetchFailure {
                        kind: R::KIND,
                        source,
                    };
                    let toast = Toast::error(err.user_message());
                    st.fetch = RequestState::Settled(Settled::Failure);
                    st.phase = EditPhase::Unavailable;
                    st.error = Some(err);
                    Some(toast)
                }
            }
        };
        if let Some(toast) = failure {
            self.ctx.toaster.show(toast);
        }
    }

    pub fn phase(&self) -> EditPhase {
        self.state().phase
    }

    pub fn id(&self) -> Option<ResourceId> {
        self.state().id
    }

    /// Local copy of the record; `None` until the fetch succeeds.
    pub fn form(&self) -> Option<R> {
        self.state().form.clone()
    }

    pub fn pending_file(&self) -> Option<PendingFile> {
        self.state().pending_file.clone()
    }

    pub fn error(&self) -> Option<ConsoleError> {
        self.state().error.clone()
    }

    pub fn fetch_state(&self) -> RequestState {
        self.state().fetch
    }

    pub fn submit_state(&self) -> RequestState {
        self.state().submit
    }

    pub fn loading_data(&self) -> bool {
        self.state().phase == EditPhase::Fetching
    }

    pub fn submit_enabled(&self) -> bool {
        self.state().phase == EditPhase::Ready
    }

    pub fn submit_label(&self) -> &'static str {
        if self.state().phase == EditPhase::Submitting {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    pub fn name_editable(&self) -> bool {
        self.policy.name_editable
    }

    pub fn set_field(&self, field: &str, value: &str) -> Result<(), FieldError> {
        let mut st = self.state();
        if st.phase != EditPhase::Ready {
            return Err(FieldError::NotReady);
        }
        let name_field = R::KIND.name_field();
        if field == name_field && !self.policy.name_editable {
            return Err(FieldError::ReadOnly(name_field));
        }
        st.form
            .as_mut()
            .ok_or(FieldError::NotReady)?
            .set_field(field, value)
    }

    /// Replaces any earlier selection.
    pub fn select_file(&self, file: PendingFile) -> Result<(), FieldError> {
        let mut st = self.state();
        if st.phase != EditPhase::Ready {
            return Err(FieldError::NotReady);
        }
        debug!(file = ?file, "file selected");
        st.pending_file = Some(file);
        Ok(())
    }

    pub fn clear_file(&self) {
        self.state().pending_file = None;
    }

    pub fn image(&self) -> Option<RemoteImage> {
        self.state().image.clone()
    }

    pub fn image_loaded(&self) {
        if let Some(img) = self.state().image.as_mut() {
            img.mark_loaded();
        }
    }

    pub fn image_failed(&self) {
        if let Some(img) = self.state().image.as_mut() {
            img.mark_failed();
        }
    }

    /// Send the form once. Returns `None` when no submission was started
    /// (not ready, already submitting) or the screen was torn down before
    /// the reply arrived.
    #[instrument(skip_all, fields(kind = R::KIND.as_str()))]
    pub async fn submit(&self) -> Option<SubmitOutcome> {
        let (id, form) = {
            let mut st = self.state();
            if st.phase != EditPhase::Ready {
                debug!(phase = ?st.phase, "submit ignored");
                return None;
            }
            let id = st.id?;
            let form = UpdateForm::from_record(st.form.as_ref()?, st.pending_file.as_ref());
            st.phase = EditPhase::Submitting;
            st.submit = RequestState::InFlight;
            (id, form)
        };
        info!(%id, with_file = form.contains(R::KIND.image_field()), "submitting update");

        let Some(result) = self
            .lifecycle
            .guard(self.ctx.service.update_record(R::KIND, id, form))
            .await
        else {
            debug!("edit screen torn down before the update reply arrived");
            self.detach(EditPhase::Submitting);
            return None;
        };
        let outcome = SubmitOutcome::from_result(result);

        let toast = {
            let mut st = self.state();
            match &outcome {
                SubmitOutcome::Success(msg) => {
                    st.submit = RequestState::Settled(Settled::Success);
                    st.phase = EditPhase::Navigated;
                    st.error = None;
                    Toast::success(msg.clone())
                }
                SubmitOutcome::BusinessConflict(message) => {
                    warn!(%message, "update rejected");
                    st.submit = RequestState::Settled(Settled::Failure);
                    st.phase = EditPhase::Ready;
                    st.error = Some(ConsoleError::SubmitConflict {
                        kind: R::KIND,
                        message: message.clone(),
                    });
                    Toast::error(message.clone())
                }
                SubmitOutcome::TransportFailure(source) => {
                    error!(error = %source, "update failed");
                    let err = ConsoleError::SubmitTransportFailure {
                        kind: R::KIND,
                        source: source.clone(),
                    };
                    let toast = Toast::error(err.user_message());
                    st.submit = RequestState::Settled(Settled::Failure);
                    st.phase = EditPhase::Ready;
                    st.error = Some(err);
                    toast
                }
            }
        };

        if outcome.is_success() {
            self.leave();
        }
        self.ctx.toaster.show(toast);
        Some(outcome)
    }

    /// Abandon the edit and return to the list.
    pub fn cancel(&self) {
        {
            let mut st = self.state();
            st.phase = EditPhase::Navigated;
            st.form = None;
            st.pending_file = None;
        }
        self.leave();
    }

    /// Abandon the request that `from` was waiting on. The phase only moves
    /// to Detached if nothing else (a cancel, say) has moved it on already.
    fn detach(&self, from: EditPhase) {
        let mut st = self.state();
        if from == EditPhase::Fetching {
            st.fetch = RequestState::Abandoned;
        } else {
            st.submit = RequestState::Abandoned;
        }
        if st.phase == from {
            st.phase = EditPhase::Detached;
        }
    }

    fn leave(&self) {
        self.lifecycle.teardown();
        self.ctx.navigator.navigate(Route::List(R::KIND));
    }
}
