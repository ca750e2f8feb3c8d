//! Consumer side: fetch raw history from the REST API and hold each view's
//! derived state.
//!
//! Every view owns its own [`LiveView`] state and re-fetches on its own
//! when the bus signals a change. Views never share caches and a failure in
//! one only ever shows up as that view's `error`.

pub mod api;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod live;
pub mod source;

pub use api::StatsApi;
pub use dashboard::{BreakdownView, DrillDownView, PlayerDashboard, PlayerDashboardData, TeamDashboard};
pub use envelope::ApiEnvelope;
pub use error::ApiError;
pub use live::{LiveView, RefreshLoop, ViewLoader, ViewState};
pub use source::StatsSource;
