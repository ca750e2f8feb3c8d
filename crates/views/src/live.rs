use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use roster_bus::{LocalBroadcastBus, Subscription};

use crate::error::ApiError;

/// What one view is currently showing.
///
/// A failed load keeps the last good `data` and sets `error`; the next
/// successful load clears it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub loading: bool,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

/// Fetches and derives one view's data from the source of truth.
#[async_trait]
pub trait ViewLoader: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// Label used in logs.
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Self::Output, ApiError>;
}

/// Per-view state driven by a [`ViewLoader`].
pub struct LiveView<L: ViewLoader> {
    loader: L,
    state: watch::Sender<ViewState<L::Output>>,
}

impl<L: ViewLoader> LiveView<L> {
    pub fn new(loader: L) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self { loader, state }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn state(&self) -> ViewState<L::Output> {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ViewState<L::Output>> {
        self.state.subscribe()
    }

    /// Load and replace the view's data. Returns whether the load succeeded.
    ///
    /// Overlapping refreshes are not fenced: whichever finishes last wins.
    pub async fn refresh(&self) -> bool {
        self.state.send_modify(|s| s.loading = true);
        let result = self.loader.load().await;
        let ok = result.is_ok();
        self.state.send_modify(|s| {
            s.loading = false;
            match result {
                Ok(data) => {
                    s.data = Some(data);
                    s.error = None;
                }
                Err(e) => {
                    warn!(view = %self.loader.name(), error = %e, "view refresh failed");
                    s.error = Some(e.to_string());
                }
            }
        });
        debug!(view = %self.loader.name(), ok, "view refreshed");
        ok
    }

    /// Re-issue the same load after a failure.
    pub async fn retry(&self) -> bool {
        info!(view = %self.loader.name(), "retrying view load");
        self.refresh().await
    }

    /// Load once now, then again after every change signal on `bus`.
    ///
    /// Signals that arrive while a load is in flight collapse into a single
    /// follow-up load.
    pub fn follow(self: Arc<Self>, bus: &LocalBroadcastBus) -> RefreshLoop {
        let wake = Arc::new(Notify::new());
        let signal = wake.clone();
        let subscription = bus.subscribe(move |_| {
            signal.notify_one();
            Ok(())
        });

        let shutdown = Arc::new(Notify::new());
        let stop = shutdown.clone();
        let task = tokio::spawn(async move {
            self.refresh().await;
            loop {
                tokio::select! {
                    biased;
                    _ = stop.notified() => break,
                    _ = wake.notified() => {
                        self.refresh().await;
                    }
                }
            }
            debug!(view = %self.loader.name(), "refresh loop stopped");
        });

        RefreshLoop {
            subscription: Some(subscription),
            shutdown,
            task: Some(task),
        }
    }
}

/// A view's bus subscription and its reload task.
///
/// Dropping it unsubscribes and aborts any in-flight load.
pub struct RefreshLoop {
    subscription: Option<Subscription>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    /// Unsubscribe, let an in-flight load finish, then stop.
    pub async fn stop(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "refresh loop ended abnormally");
            }
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
