use std::sync::Arc;

use crate::bus::PublishReport;

/// Publishes a "something changed" signal to every current subscriber.
///
/// The feed client depends on this trait rather than on a concrete bus so
/// it can be driven against a recording fake in tests.
pub trait SignalPublisher: Send + Sync {
    fn publish(&self) -> PublishReport;
}

/// Blanket implementation so `Arc<dyn SignalPublisher>` can be used directly.
impl<T: SignalPublisher + ?Sized> SignalPublisher for Arc<T> {
    fn publish(&self) -> PublishReport {
        (**self).publish()
    }
}
