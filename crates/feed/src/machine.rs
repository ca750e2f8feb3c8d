use std::time::Duration;

use roster_core::config::FeedConfig;

/// The only payload that triggers a change signal.
pub const REFRESH_TOKEN: &str = "refresh";

/// Exponential backoff with a ceiling and a retry cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_retries: 5,
        }
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_retries: config.max_retries,
        }
    }

    /// `min(base * 2^retry, max)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Connecting,
    Open,
    BackoffWait { retry: u32, delay: Duration },
    /// Retry cap exceeded. Live updates stay off; nothing else is affected.
    Disabled,
    /// Torn down by the owner.
    Stopped,
}

impl FeedState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedState::Disabled | FeedState::Stopped)
    }
}

/// What the driver must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAction {
    /// Close any current connection, then open a new one tagged `generation`.
    Connect { generation: u64 },
    /// Publish one change signal.
    Publish,
    /// Sleep, then report [`FeedStateMachine::on_retry_elapsed`].
    Wait { delay: Duration },
    /// Close everything; no further transitions.
    Stop,
    Nothing,
}

/// Reconnect state machine for the push channel.
///
/// `Connecting → Open → (message)* → failure → BackoffWait → Connecting`,
/// ending in `Disabled` once more than `max_retries` consecutive failures
/// occur, or in `Stopped` on teardown. Every connection attempt gets a new
/// generation; events carrying an older generation are ignored.
#[derive(Debug, Clone)]
pub struct FeedStateMachine {
    policy: ReconnectPolicy,
    state: FeedState,
    retry_count: u32,
    generation: u64,
}

impl FeedStateMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: FeedState::Idle,
            retry_count: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Start a fresh attempt, superseding whatever connection exists.
    pub fn connect(&mut self) -> FeedAction {
        if self.state.is_terminal() {
            return FeedAction::Stop;
        }
        self.generation += 1;
        self.state = FeedState::Connecting;
        FeedAction::Connect {
            generation: self.generation,
        }
    }

    pub fn on_open(&mut self, generation: u64) -> FeedAction {
        if !self.is_current(generation) || self.state != FeedState::Connecting {
            return FeedAction::Nothing;
        }
        self.state = FeedState::Open;
        self.retry_count = 0;
        FeedAction::Nothing
    }

    pub fn on_message(&mut self, generation: u64, payload: &str) -> FeedAction {
        if self.is_current(generation) && self.state == FeedState::Open && payload == REFRESH_TOKEN {
            FeedAction::Publish
        } else {
            FeedAction::Nothing
        }
    }

    /// Connection error or close, whether or not it had opened.
    pub fn on_failure(&mut self, generation: u64) -> FeedAction {
        if !self.is_current(generation)
            || !matches!(self.state, FeedState::Connecting | FeedState::Open)
        {
            return FeedAction::Nothing;
        }
        if self.retry_count >= self.policy.max_retries {
            self.state = FeedState::Disabled;
            return FeedAction::Stop;
        }
        self.retry_count += 1;
        let delay = self.policy.delay_for(self.retry_count);
        self.state = FeedState::BackoffWait {
            retry: self.retry_count,
            delay,
        };
        FeedAction::Wait { delay }
    }

    pub fn on_retry_elapsed(&mut self) -> FeedAction {
        match self.state {
            FeedState::BackoffWait { .. } => self.connect(),
            _ => FeedAction::Nothing,
        }
    }

    /// Teardown. Valid from any state.
    pub fn shutdown(&mut self) -> FeedAction {
        self.state = FeedState::Stopped;
        FeedAction::Stop
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

impl Default for FeedStateMachine {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(machine: &mut FeedStateMachine) -> u64 {
        let FeedAction::Connect { generation } = machine.connect() else {
            panic!("expected connect");
        };
        generation
    }

    #[test]
    fn backoff_sequence_caps_and_then_disables() {
        let mut m = FeedStateMachine::default();
        let gen = connected(&mut m);
        m.on_open(gen);

        let mut delays = Vec::new();
        let mut gen = gen;
        for _ in 0..5 {
            match m.on_failure(gen) {
                FeedAction::Wait { delay } => delays.push(delay.as_millis() as u64),
                other => panic!("expected wait, got {other:?}"),
            }
            let FeedAction::Connect { generation } = m.on_retry_elapsed() else {
                panic!("expected reconnect");
            };
            gen = generation;
        }
        assert_eq!(delays, vec![2000, 4000, 8000, 16000, 30000]);

        assert_eq!(m.on_failure(gen), FeedAction::Stop);
        assert_eq!(m.state(), FeedState::Disabled);
        assert_eq!(m.connect(), FeedAction::Stop);
    }

    #[test]
    fn open_resets_retry_count() {
        let mut m = FeedStateMachine::default();
        let gen = connected(&mut m);
        m.on_failure(gen);
        m.on_failure(gen);
        assert_eq!(m.retry_count(), 1, "second failure for a dead attempt is ignored");

        let FeedAction::Connect { generation } = m.on_retry_elapsed() else {
            panic!("expected reconnect");
        };
        m.on_open(generation);
        assert_eq!(m.state(), FeedState::Open);
        assert_eq!(m.retry_count(), 0);
        assert_eq!(
            m.on_failure(generation),
            FeedAction::Wait { delay: Duration::from_millis(2000) }
        );
    }

    #[test]
    fn only_refresh_payload_publishes() {
        let mut m = FeedStateMachine::default();
        let gen = connected(&mut m);
        assert_eq!(m.on_message(gen, "refresh"), FeedAction::Nothing, "not open yet");
        m.on_open(gen);
        assert_eq!(m.on_message(gen, "refresh"), FeedAction::Publish);
        assert_eq!(m.on_message(gen, "ping"), FeedAction::Nothing);
        assert_eq!(m.on_message(gen, "Refresh"), FeedAction::Nothing);
        assert_eq!(m.on_message(gen, ""), FeedAction::Nothing);
    }

    #[test]
    fn new_connect_supersedes_old_generation() {
        let mut m = FeedStateMachine::default();
        let old = connected(&mut m);
        m.on_open(old);
        let new = connected(&mut m);
        assert!(new > old);

        assert_eq!(m.on_message(old, "refresh"), FeedAction::Nothing);
        assert_eq!(m.on_failure(old), FeedAction::Nothing);
        assert_eq!(m.state(), FeedState::Connecting);

        m.on_open(new);
        assert_eq!(m.on_message(new, "refresh"), FeedAction::Publish);
    }

    #[test]
    fn shutdown_during_backoff_is_terminal() {
        let mut m = FeedStateMachine::default();
        let gen = connected(&mut m);
        m.on_failure(gen);
        assert!(matches!(m.state(), FeedState::BackoffWait { retry: 1, .. }));

        assert_eq!(m.shutdown(), FeedAction::Stop);
        assert_eq!(m.on_retry_elapsed(), FeedAction::Nothing);
        assert_eq!(m.connect(), FeedAction::Stop);
        assert_eq!(m.state(), FeedState::Stopped);
    }

    #[test]
    fn delay_never_overflows() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(30_000));
    }

    #[test]
    fn policy_reads_config() {
        let policy = ReconnectPolicy::from_config(&FeedConfig {
            path: "/events".into(),
            base_delay_ms: 10,
            max_delay_ms: 50,
            max_retries: 2,
        });
        assert_eq!(policy.delay_for(3), Duration::from_millis(50));
        assert_eq!(policy.max_retries, 2);
    }
}
