use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use roster_bus::LocalBroadcastBus;
use roster_core::{AuthorizationContext, MatchRecord, MatchType};
use roster_stats::{team_stats, Dimension, KdaTier, PlayerBreakdown, StatsAggregator, TeamStats};
use roster_views::{
    ApiError, BreakdownView, DrillDownView, LiveView, PlayerDashboard, StatsSource, TeamDashboard,
};

/// In-memory backend whose history and availability tests can change.
#[derive(Default)]
struct FakeSource {
    history: Mutex<Vec<MatchRecord>>,
    down: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSource {
    fn with(history: Vec<MatchRecord>) -> Arc<Self> {
        let source = Self::default();
        *source.history.lock().unwrap() = history;
        Arc::new(source)
    }

    fn push(&self, record: MatchRecord) {
        self.history.lock().unwrap().push(record);
    }

    fn check(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StatsSource for FakeSource {
    async fn matches(&self, _subject: &str, match_type: MatchType) -> Result<Vec<MatchRecord>, ApiError> {
        self.check()?;
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.match_type == match_type)
            .cloned()
            .collect())
    }

    async fn team_stats(&self, _team_id: &str) -> Result<TeamStats, ApiError> {
        self.check()?;
        Ok(team_stats(&self.history.lock().unwrap()))
    }

    async fn player_breakdown(&self, _player_id: &str) -> Result<PlayerBreakdown, ApiError> {
        self.check()?;
        Ok(StatsAggregator::new(&self.history.lock().unwrap()).player_breakdown())
    }
}

fn record(id: &str, date: &str, agent: &str, kills: u32, deaths: u32, win: bool) -> MatchRecord {
    let mut r = MatchRecord::new(id, MatchType::Scrim);
    r.date = Some(date.to_string());
    r.agent = agent.to_string();
    r.role = "Duelist".to_string();
    r.map = Some("Ascent".to_string());
    r.kills = kills;
    r.deaths = deaths;
    r.acs = Some(200.0);
    r.is_win = Some(win);
    r.player_id = Some("p1".to_string());
    r.player_name = Some("Nova".to_string());
    r
}

fn history() -> Vec<MatchRecord> {
    vec![
        record("1", "2024-05-02T19:00:00Z", "Jett", 20, 10, true),
        record("2", "2024-05-20T19:00:00Z", "Jett", 8, 12, false),
        record("3", "2024-04-11T19:00:00Z", "Omen", 15, 10, true),
    ]
}

fn owner() -> AuthorizationContext {
    AuthorizationContext::viewer("Player", Some("p1".into()))
        .subject_owner(Some("p1".into()))
        .advanced(true)
}

fn stranger() -> AuthorizationContext {
    AuthorizationContext::viewer("Player", Some("p9".into()))
        .subject_owner(Some("p1".into()))
        .advanced(true)
}

#[tokio::test]
async fn refresh_populates_view_state() {
    let source = FakeSource::with(history());
    let view = LiveView::new(PlayerDashboard::new(source, "p1", MatchType::Scrim, owner()));

    assert!(view.state().data.is_none());
    assert!(view.refresh().await);

    let state = view.state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    let data = state.data.expect("loaded");
    assert_eq!(data.summary.games, 3);
    assert_eq!(data.window, "All");
    assert_eq!(data.windows.len(), 2);
    assert!(data.advanced.is_some());
}

#[tokio::test]
async fn window_label_scopes_the_summary() {
    let source = FakeSource::with(history());
    let view = LiveView::new(
        PlayerDashboard::new(source, "p1", MatchType::Scrim, stranger()).with_window("2024-05"),
    );
    view.refresh().await;

    let data = view.state().data.unwrap();
    assert_eq!(data.window, "May 2024");
    assert_eq!(data.summary.games, 2);
    assert_eq!(data.summary.win_rate, 50);
    assert_eq!(data.summary.kda, "1.27");
    assert_eq!(data.tier, KdaTier::Good);
    assert_eq!(data.agents[0].agent, "Jett");
    assert!(data.advanced.is_none(), "strangers get basic stats only");
}

#[tokio::test]
async fn failure_is_kept_on_the_view_and_retry_recovers() {
    let source = FakeSource::with(history());
    let view = LiveView::new(TeamDashboard::new(source.clone(), "t1", MatchType::Scrim));
    assert!(view.refresh().await);

    source.down.store(true, Ordering::SeqCst);
    assert!(!view.refresh().await);
    let state = view.state();
    assert_eq!(state.error.as_deref(), Some("server returned 503: maintenance"));
    assert_eq!(state.data.as_ref().map(|d| d.games_played), Some(3), "last good data kept");
    assert!(!state.loading);

    source.down.store(false, Ordering::SeqCst);
    assert!(view.retry().await);
    assert!(view.state().error.is_none());
}

#[tokio::test]
async fn one_failing_view_does_not_affect_another() {
    let healthy = FakeSource::with(history());
    let broken = FakeSource::with(history());
    broken.down.store(true, Ordering::SeqCst);

    let bus = LocalBroadcastBus::new();
    let good = Arc::new(LiveView::new(TeamDashboard::new(healthy, "t1", MatchType::Scrim)));
    let bad = Arc::new(LiveView::new(TeamDashboard::new(broken, "t1", MatchType::Scrim)));
    let good_loop = good.clone().follow(&bus);
    let bad_loop = bad.clone().follow(&bus);

    let mut good_state = good.watch();
    good_state
        .wait_for(|s| s.data.is_some())
        .await
        .expect("view alive");
    let mut bad_state = bad.watch();
    bad_state
        .wait_for(|s| s.error.is_some())
        .await
        .expect("view alive");
    assert!(good.state().error.is_none());

    good_loop.stop().await;
    bad_loop.stop().await;
}

#[tokio::test]
async fn change_signal_triggers_refetch() {
    let source = FakeSource::with(history());
    let bus = LocalBroadcastBus::new();
    let view = Arc::new(LiveView::new(PlayerDashboard::new(
        source.clone(),
        "p1",
        MatchType::Scrim,
        owner(),
    )));
    let refresh_loop = view.clone().follow(&bus);
    assert_eq!(bus.subscriber_count(), 1);

    let mut state = view.watch();
    state
        .wait_for(|s| s.data.as_ref().is_some_and(|d| d.summary.games == 3))
        .await
        .expect("initial load");

    source.push(record("4", "2024-05-28T19:00:00Z", "Omen", 10, 5, true));
    bus.publish();
    state
        .wait_for(|s| s.data.as_ref().is_some_and(|d| d.summary.games == 4))
        .await
        .expect("reload after signal");

    refresh_loop.stop().await;
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn signal_bursts_are_coalesced() {
    let source = FakeSource::with(history());
    let bus = LocalBroadcastBus::new();
    let view = Arc::new(LiveView::new(TeamDashboard::new(source.clone(), "t1", MatchType::Scrim)));
    let refresh_loop = view.clone().follow(&bus);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let initial = source.calls.load(Ordering::SeqCst);
    assert_eq!(initial, 1);

    for _ in 0..5 {
        bus.publish();
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    let reloads = source.calls.load(Ordering::SeqCst) - initial;
    assert!(
        (1..=2).contains(&reloads),
        "five back-to-back signals caused {reloads} reloads"
    );

    drop(refresh_loop);
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test]
async fn breakdown_is_not_fetched_for_denied_viewers() {
    let source = FakeSource::with(history());
    let denied = LiveView::new(BreakdownView::new(source.clone(), "p1", stranger()));
    assert!(denied.refresh().await);
    assert_eq!(denied.state().data, Some(None));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    let coach = AuthorizationContext::viewer("Coach", Some("c1".into())).advanced(true);
    let allowed = LiveView::new(BreakdownView::new(source.clone(), "p1", coach));
    allowed.refresh().await;
    let breakdown = allowed.state().data.flatten().expect("coach sees breakdown");
    assert_eq!(breakdown.agent_stats.len(), 2);
    assert_eq!(breakdown.history[0].match_id, "2");
}

#[tokio::test]
async fn drilldown_view_resolves_against_fresh_history() {
    let source = FakeSource::with(history());
    let view = LiveView::new(DrillDownView::new(
        source,
        "p1",
        MatchType::Scrim,
        Dimension::Agent,
        "Jett",
        owner(),
    ));
    view.refresh().await;

    let drill = view.state().data.unwrap();
    assert_eq!(drill.summary.games, 2);
    assert_eq!(drill.summary.kda, "1.27");
    let detail = drill.detail.expect("owner sees detail");
    let order: Vec<&str> = detail.matches.iter().map(|m| m.match_id.as_str()).collect();
    assert_eq!(order, vec!["2", "1"]);
}
