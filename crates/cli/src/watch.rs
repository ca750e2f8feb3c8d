//! Wires config → push channel → bus → live views and logs what each view
//! derives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use roster_bus::LocalBroadcastBus;
use roster_core::Config;
use roster_feed::{ChangeFeedClient, ReconnectPolicy, SseTransport};
use roster_stats::{DrillDown, TeamSummary};
use roster_views::{
    DrillDownView, LiveView, PlayerDashboard, PlayerDashboardData, RefreshLoop, StatsApi,
    StatsSource, TeamDashboard, ViewLoader,
};

use crate::cli::CliArgs;

/// Views requested on the command line, not yet started.
struct Views {
    player: Option<Arc<LiveView<PlayerDashboard>>>,
    drill: Option<Arc<LiveView<DrillDownView>>>,
    team: Option<Arc<LiveView<TeamDashboard>>>,
}

impl Views {
    fn build(source: Arc<dyn StatsSource>, args: &CliArgs) -> Result<Self> {
        if args.player.is_none() && args.team.is_none() {
            bail!("nothing to watch: pass --player and/or --team");
        }
        let viewer = args.viewer_context();

        let player = args.player.as_ref().map(|id| {
            Arc::new(LiveView::new(
                PlayerDashboard::new(source.clone(), id, args.match_type, viewer.clone())
                    .with_window(&args.window),
            ))
        });
        let drill = match (&args.player, &args.drill) {
            (Some(id), Some((dimension, value))) => Some(Arc::new(LiveView::new(DrillDownView::new(
                source.clone(),
                id,
                args.match_type,
                *dimension,
                value,
                viewer.clone(),
            )))),
            (None, Some(_)) => bail!("--drill needs --player"),
            _ => None,
        };
        let team = args
            .team
            .as_ref()
            .map(|id| Arc::new(LiveView::new(TeamDashboard::new(source.clone(), id, args.match_type))));

        Ok(Self { player, drill, team })
    }

    /// Load each view once. Fails if any view could not load.
    async fn load_once(&self) -> Result<()> {
        let mut failed = 0;
        if let Some(view) = &self.player {
            failed += show_once(view, render_player).await;
        }
        if let Some(view) = &self.drill {
            failed += show_once(view, render_drill).await;
        }
        if let Some(view) = &self.team {
            failed += show_once(view, render_team).await;
        }
        if failed > 0 {
            bail!("{failed} view(s) failed to load");
        }
        Ok(())
    }

    /// Subscribe every view to the bus and start logging its updates.
    fn follow(&self, bus: &LocalBroadcastBus, retry_after: Duration) -> (Vec<RefreshLoop>, Vec<JoinHandle<()>>) {
        let mut loops = Vec::new();
        let mut reporters = Vec::new();
        if let Some(view) = &self.player {
            loops.push(view.clone().follow(bus));
            reporters.push(tokio::spawn(report(view.clone(), retry_after, render_player)));
        }
        if let Some(view) = &self.drill {
            loops.push(view.clone().follow(bus));
            reporters.push(tokio::spawn(report(view.clone(), retry_after, render_drill)));
        }
        if let Some(view) = &self.team {
            loops.push(view.clone().follow(bus));
            reporters.push(tokio::spawn(report(view.clone(), retry_after, render_team)));
        }
        (loops, reporters)
    }
}

pub async fn run(config: &Config, args: &CliArgs) -> Result<()> {
    let api = StatsApi::new(&config.api).context("failed to build API client")?;
    let views = Views::build(Arc::new(api), args)?;

    if args.once {
        return views.load_once().await;
    }

    let bus = LocalBroadcastBus::new();
    let (loops, reporters) = views.follow(&bus, args.retry_after());

    let transport = SseTransport::new(config.feed_url(), Duration::from_secs(config.api.timeout_secs))
        .context("failed to build push channel client")?;
    let feed = ChangeFeedClient::new(
        transport,
        Arc::new(bus.clone()),
        ReconnectPolicy::from_config(&config.feed),
    )
    .spawn();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl_c")?;
    info!("shutting down");

    let feed_state = feed.shutdown().await;
    for refresh_loop in loops {
        refresh_loop.stop().await;
    }
    for reporter in reporters {
        reporter.abort();
    }
    info!(feed = ?feed_state, subscribers = bus.subscriber_count(), "stopped");
    Ok(())
}

async fn show_once<L: ViewLoader>(view: &Arc<LiveView<L>>, render: fn(&L::Output)) -> usize {
    view.refresh().await;
    let state = view.state();
    match (&state.error, &state.data) {
        (Some(e), _) => {
            warn!(view = %view.loader().name(), error = %e, "view failed to load");
            1
        }
        (None, Some(data)) => {
            render(data);
            0
        }
        (None, None) => 0,
    }
}

/// Log every settled state of one view; retry it after `retry_after` while
/// it is failing and no change signal arrives first.
async fn report<L: ViewLoader>(view: Arc<LiveView<L>>, retry_after: Duration, render: fn(&L::Output)) {
    let mut updates = view.watch();
    loop {
        let state = updates.borrow_and_update().clone();
        if !state.loading {
            if let Some(e) = &state.error {
                warn!(
                    view = %view.loader().name(),
                    error = %e,
                    retry_in_secs = retry_after.as_secs(),
                    "view failed"
                );
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(retry_after) => {
                        view.retry().await;
                    }
                }
                continue;
            }
            if let Some(data) = &state.data {
                render(data);
            }
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}

fn render_player(data: &PlayerDashboardData) {
    let s = &data.summary;
    info!(
        window = %data.window,
        games = s.games,
        wins = s.wins,
        losses = s.losses,
        win_rate = s.win_rate,
        kda = %s.kda,
        tier = ?data.tier,
        acs = s.acs,
        "player summary"
    );
    for agent in &data.agents {
        info!(
            agent = %agent.agent,
            games = agent.games,
            win_rate = agent.win_rate,
            pick_rate = agent.pick_rate,
            kda = %agent.kda,
            acs = agent.acs,
            "agent performance"
        );
    }
    match &data.advanced {
        Some(breakdown) => {
            for (dimension, rows) in [
                ("role", &breakdown.role_stats),
                ("map", &breakdown.map_stats),
            ] {
                for row in rows {
                    info!(
                        dimension,
                        name = %row.name,
                        games = row.games,
                        win_rate = row.win_rate,
                        kd = %row.kd,
                        acs = row.acs,
                        "breakdown"
                    );
                }
            }
        }
        None => info!("advanced breakdown not available to this viewer"),
    }
}

fn render_drill(drill: &DrillDown) {
    let s = &drill.summary;
    info!(
        dimension = %drill.dimension,
        value = %drill.value,
        games = s.games,
        win_rate = s.win_rate,
        kda = %s.kda,
        acs = s.acs,
        "drill-down"
    );
    match &drill.detail {
        Some(detail) => {
            if !detail.agents_used.is_empty() {
                info!(agents = ?detail.agents_used, "agents used in role");
            }
            for point in &detail.trend {
                info!(
                    match_id = %point.match_id,
                    date = %point.date,
                    kda = point.kda,
                    acs = point.acs,
                    "trend"
                );
            }
        }
        None => info!("drill-down detail not available to this viewer"),
    }
}

fn render_team(summary: &TeamSummary) {
    info!(
        games = summary.games_played,
        wins = summary.wins,
        losses = summary.losses,
        win_rate = summary.win_rate,
        "team summary"
    );
    for player in &summary.top_players {
        info!(
            name = %player.name,
            games = player.games,
            kda = %player.kda,
            acs = player.acs,
            win_rate = player.win_rate,
            "top player"
        );
    }
}
