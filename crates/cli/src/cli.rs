use std::time::Duration;

use clap::Parser;

use roster_core::{AuthorizationContext, MatchType};
use roster_stats::Dimension;

/// Follow live roster stats.
///
/// Loads the requested dashboards once, then reloads each of them whenever
/// the backend pushes a change event. Stops on Ctrl+C.
#[derive(Parser, Debug)]
#[command(name = "roster-watch", about = "Follow live roster stats")]
pub struct CliArgs {
    /// Player whose dashboard to follow
    #[arg(long, env = "ROSTER_PLAYER")]
    pub player: Option<String>,

    /// Team whose summary to follow
    #[arg(long, env = "ROSTER_TEAM")]
    pub team: Option<String>,

    /// Match type: scrim or tournament
    #[arg(long = "type", default_value = "scrim")]
    pub match_type: MatchType,

    /// Reporting window: "All", "May 2024" or "2024-05"
    #[arg(long, default_value = "All")]
    pub window: String,

    /// Drill into one agent, role or map of the player, e.g. `agent:Jett`
    #[arg(long, value_parser = parse_drill)]
    pub drill: Option<(Dimension, String)>,

    /// Comma-separated role tags of the viewer
    #[arg(long, env = "ROSTER_VIEWER_ROLE", default_value = "")]
    pub viewer_role: String,

    /// Account id of the viewer
    #[arg(long, env = "ROSTER_VIEWER_ID")]
    pub viewer_id: Option<String>,

    /// Account id linked to the watched player
    #[arg(long)]
    pub owner_id: Option<String>,

    /// Request advanced breakdowns (shown only if the viewer may see them)
    #[arg(long)]
    pub advanced: bool,

    /// API base URL override
    #[arg(long)]
    pub api_url: Option<String>,

    /// Seconds to wait before retrying a failed view
    #[arg(long, default_value = "15")]
    pub retry_secs: u64,

    /// Load every view once and exit without opening the push channel
    #[arg(long)]
    pub once: bool,
}

impl CliArgs {
    pub fn viewer_context(&self) -> AuthorizationContext {
        AuthorizationContext::viewer(self.viewer_role.clone(), self.viewer_id.clone())
            .subject_owner(self.owner_id.clone())
            .advanced(self.advanced)
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_secs.max(1))
    }
}

fn parse_drill(raw: &str) -> Result<(Dimension, String), String> {
    let (dimension, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected <agent|role|map>:<value>, got `{raw}`"))?;
    let dimension: Dimension = dimension.parse().map_err(|e| format!("{e}"))?;
    if value.is_empty() {
        return Err("drill-down value must not be empty".to_string());
    }
    Ok((dimension, value.to_string()))
}
