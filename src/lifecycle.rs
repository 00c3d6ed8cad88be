use std::future::Future;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Success,
    Failure,
}

/// Progress of one asynchronous operation owned by a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    NotStarted,
    InFlight,
    Settled(Settled),
    /// The screen was torn down while the request was in flight; its result
    /// was discarded.
    Abandoned,
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }
}

/// Mount scope of a screen. Async work started while mounted is raced
/// against teardown, and its result is dropped once the screen is gone.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Idempotent.
    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub async fn torn_down(&self) {
        self.token.cancelled().await
    }

    /// Run `fut` unless the screen goes away first. Returns `None` when the
    /// result must not be applied, including the case where teardown lands
    /// in the same poll that completed `fut`.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        if !self.is_active() {
            return None;
        }
        let out = tokio::select! {
            biased;
            _ = self.token.cancelled() => return None,
            out = fut => out,
        };
        if !self.is_active() {
            return None;
        }
        Some(out)
    }
}
