use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use roster_bus::SignalPublisher;

use crate::machine::{FeedAction, FeedState, FeedStateMachine, ReconnectPolicy};
use crate::transport::{ChangeTransport, MessageStream};

/// Drives a [`FeedStateMachine`] against a live transport and turns every
/// `refresh` message into one published change signal.
///
/// Connection loss never reaches the publisher's subscribers; it only moves
/// the machine through backoff until it either reconnects or disables itself.
pub struct ChangeFeedClient<T> {
    transport: T,
    publisher: Arc<dyn SignalPublisher>,
    machine: FeedStateMachine,
    state_tx: watch::Sender<FeedState>,
}

impl<T: ChangeTransport + 'static> ChangeFeedClient<T> {
    pub fn new(transport: T, publisher: Arc<dyn SignalPublisher>, policy: ReconnectPolicy) -> Self {
        let machine = FeedStateMachine::new(policy);
        let (state_tx, _) = watch::channel(machine.state());
        Self {
            transport,
            publisher,
            machine,
            state_tx,
        }
    }

    /// Observe state transitions (e.g. to surface "live updates off").
    pub fn watch_state(&self) -> watch::Receiver<FeedState> {
        self.state_tx.subscribe()
    }

    /// Run on the current runtime until disabled or shut down.
    pub fn spawn(self) -> FeedHandle {
        let shutdown = Arc::new(Notify::new());
        let state = self.watch_state();
        let task_shutdown = shutdown.clone();
        let task = tokio::spawn(async move { self.run(task_shutdown).await });
        FeedHandle {
            shutdown,
            state,
            task: Some(task),
        }
    }

    /// Connect, pump messages, back off and reconnect until a terminal state.
    pub async fn run(mut self, shutdown: Arc<Notify>) -> FeedState {
        info!(endpoint = %self.transport.endpoint(), "starting change feed");
        let mut action = self.machine.connect();

        loop {
            self.report_state();
            action = match action {
                FeedAction::Connect { generation } => {
                    let attempt = tokio::select! {
                        biased;
                        _ = shutdown.notified() => None,
                        result = self.transport.connect() => Some(result),
                    };
                    match attempt {
                        None => self.machine.shutdown(),
                        Some(Ok(stream)) => {
                            self.machine.on_open(generation);
                            self.report_state();
                            info!(generation, "change feed connected");
                            self.pump(generation, stream, &shutdown).await
                        }
                        Some(Err(e)) => {
                            warn!(generation, error = %e, "change feed connect failed");
                            self.machine.on_failure(generation)
                        }
                    }
                }
                FeedAction::Wait { delay } => {
                    info!(
                        retry = self.machine.retry_count(),
                        delay_ms = delay.as_millis() as u64,
                        "change feed reconnecting after backoff"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.notified() => self.machine.shutdown(),
                        _ = tokio::time::sleep(delay) => self.machine.on_retry_elapsed(),
                    }
                }
                FeedAction::Stop => break,
                other => {
                    debug!(?other, "no further feed transitions");
                    break;
                }
            };
        }

        let state = self.machine.state();
        self.report_state();
        match state {
            FeedState::Disabled => warn!(
                retries = self.machine.policy().max_retries,
                "change feed disabled after repeated failures; live updates are off"
            ),
            _ => info!("change feed stopped"),
        }
        state
    }

    /// Read one connection until it fails, closes or shutdown is requested.
    /// The stream is dropped (closed) on return.
    async fn pump(&mut self, generation: u64, mut stream: MessageStream, shutdown: &Notify) -> FeedAction {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.notified() => return self.machine.shutdown(),
                next = stream.next() => match next {
                    Some(Ok(payload)) => match self.machine.on_message(generation, &payload) {
                        FeedAction::Publish => {
                            let report = self.publisher.publish();
                            if !report.is_clean() {
                                warn!(
                                    delivered = report.delivered,
                                    failed = report.failures.len(),
                                    "change signal handlers failed"
                                );
                            }
                            debug!(delivered = report.delivered, "change signal published");
                        }
                        _ => debug!(payload = %payload, "ignoring feed message"),
                    },
                    Some(Err(e)) => {
                        warn!(generation, error = %e, "change feed connection error");
                        return self.machine.on_failure(generation);
                    }
                    None => {
                        info!(generation, "change feed closed by server");
                        return self.machine.on_failure(generation);
                    }
                },
            }
        }
    }

    fn report_state(&self) {
        self.state_tx.send_replace(self.machine.state());
    }
}

/// Owner side of a spawned feed client.
///
/// Dropping the handle aborts the task, which closes any open connection
/// and cancels a pending reconnect.
pub struct FeedHandle {
    shutdown: Arc<Notify>,
    state: watch::Receiver<FeedState>,
    task: Option<JoinHandle<FeedState>>,
}

impl FeedHandle {
    pub fn state(&self) -> FeedState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Stop the client and wait for it to close its connection.
    pub async fn shutdown(mut self) -> FeedState {
        self.shutdown.notify_one();
        let Some(task) = self.task.take() else {
            return self.state();
        };
        match task.await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "change feed task ended abnormally");
                FeedState::Stopped
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
