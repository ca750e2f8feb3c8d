//! Client side of the server push channel.
//!
//! [`FeedStateMachine`] holds every reconnect decision and can be driven by
//! hand in tests. [`ChangeFeedClient`] runs it against a real
//! [`ChangeTransport`] on tokio and publishes one change signal per
//! `refresh` message.

pub mod client;
pub mod error;
pub mod machine;
pub mod sse;
pub mod transport;

pub use client::{ChangeFeedClient, FeedHandle};
pub use error::FeedError;
pub use machine::{FeedAction, FeedState, FeedStateMachine, ReconnectPolicy, REFRESH_TOKEN};
pub use sse::{SseEvent, SseParser};
pub use transport::{ChangeTransport, MessageStream, SseTransport};
