//! Optional metrics collaborator contract.
//!
//! The dispatcher notifies the hook immediately before a checkout is
//! attempted and again if that checkout times out. A group with no metrics
//! configured carries [`NoopMetrics`], so the dispatch path never branches
//! on presence.

use std::any::Any;

/// Point-in-time snapshot of one pool's occupancy, taken just before a
/// checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// size + max_overflow; the hard bound on concurrent workers.
    pub capacity: usize,
    /// Workers currently checked out.
    pub in_flight: usize,
    /// Idle workers holding warm connections.
    pub idle: usize,
}

/// State handed back by [`MetricsHook::on_queue`] and returned to the hook
/// on checkout timeout. Opaque to the core.
pub type QueueToken = Box<dyn Any + Send>;

pub trait MetricsHook: Send + Sync {
    /// Called immediately before checkout is attempted.
    fn on_queue(&self, pool: &str, status: PoolStatus, method: &str, path: &str) -> QueueToken;

    /// Called if the checkout itself timed out, with the token produced by
    /// the matching [`on_queue`](MetricsHook::on_queue) call.
    fn on_queue_timeout(&self, token: QueueToken);
}

/// Null-object hook used when a group configures no metrics.
pub struct NoopMetrics;

impl MetricsHook for NoopMetrics {
    fn on_queue(&self, _pool: &str, _status: PoolStatus, _method: &str, _path: &str) -> QueueToken {
        Box::new(())
    }

    fn on_queue_timeout(&self, _token: QueueToken) {}
}
