//! Process-local fan-out of zero-payload change signals.
//!
//! Producers (the push-channel client) hold a [`SignalPublisher`]; consumers
//! (dashboard views) register handlers on a [`LocalBroadcastBus`] and keep
//! the returned [`Subscription`] alive for as long as they want signals.

pub mod bus;
pub mod traits;

pub use bus::{
    ChangeSignal, HandlerError, HandlerFailure, HandlerResult, LocalBroadcastBus, PublishReport,
    Subscription,
};
pub use traits::SignalPublisher;
