//! Bounded per-host worker pools and their lifecycle registry.
//!
//! One [`Pool`] exists per [`PoolKey`]; it bounds concurrency to
//! size + max_overflow workers and hands them out under a checkout timeout.
//! [`PoolRegistry`] creates pools lazily and race-safely on first use.

pub mod key;
pub mod registry;
pub mod worker;

pub use key::PoolKey;
pub use registry::PoolRegistry;
pub use worker::Worker;

use crate::base::Error;
use crate::config::{ResolvedConnOptions, Strategy};
use crate::http::Request;
use crate::metrics::PoolStatus;
use crate::transport::{RawResponse, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Settings a pool was created with, kept for mismatch detection when a
/// later caller races against the live instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub size: usize,
    pub max_overflow: usize,
    pub strategy: Strategy,
    pub conn_opts: ResolvedConnOptions,
}

/// Bounded collection of workers for one (group, host, port) key.
///
/// Capacity is enforced with a semaphore of size + max_overflow permits;
/// checkout is a timeout-bounded permit acquire. The permit is held for the
/// whole execution and released by RAII, so a failed worker never corrupts
/// the accounting. Workers beyond the base size are transient: they retire
/// instead of returning to the idle set.
pub struct Pool {
    key: PoolKey,
    name: String,
    settings: PoolSettings,
    conn_opts: Arc<ResolvedConnOptions>,
    transport: Arc<dyn Transport>,
    capacity: Semaphore,
    idle: Mutex<VecDeque<Worker>>,
}

impl Pool {
    pub fn new(
        key: PoolKey,
        settings: PoolSettings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, Error> {
        let capacity = settings.size + settings.max_overflow;
        if capacity == 0 {
            return Err(Error::PoolCreation(format!(
                "pool {key} would have zero capacity"
            )));
        }
        let name = key.to_string();
        let conn_opts = Arc::new(settings.conn_opts.clone());
        Ok(Self {
            key,
            name,
            settings,
            conn_opts,
            transport,
            capacity: Semaphore::new(capacity),
            idle: Mutex::new(VecDeque::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Occupancy snapshot, used by the metrics hook just before checkout.
    pub fn status(&self) -> PoolStatus {
        let capacity = self.settings.size + self.settings.max_overflow;
        PoolStatus {
            capacity,
            in_flight: capacity - self.capacity.available_permits(),
            idle: self.with_idle(|idle| idle.len()),
        }
    }

    /// Check out a worker (waiting at most `wait`), run the request under
    /// `budget`, and return the worker. Checkout expiry is
    /// [`Error::PoolTimeout`]; the two budgets never bleed into each other.
    pub async fn execute(
        &self,
        req: Request,
        wait: Duration,
        budget: Duration,
    ) -> Result<RawResponse, Error> {
        let _permit = match tokio::time::timeout(wait, self.capacity.acquire()).await {
            // Acquire only fails on a closed semaphore, and nothing ever
            // closes this one.
            Ok(acquired) => match acquired {
                Ok(permit) => permit,
                Err(_) => unreachable!("pool semaphore is never closed"),
            },
            Err(_) => return Err(Error::PoolTimeout),
        };

        let mut worker = match self.take_idle() {
            Some(worker) => worker,
            None => Worker::new(
                self.key.host.clone(),
                self.key.port,
                Arc::clone(&self.conn_opts),
                Arc::clone(&self.transport),
            ),
        };

        let result = worker.execute(req, budget).await;
        if result.is_ok() {
            // Failed or timed-out workers are dropped here instead; their
            // replacement is built lazily by a later checkout.
            self.restore(worker);
        }
        result
    }

    fn take_idle(&self) -> Option<Worker> {
        self.with_idle(|idle| match self.settings.strategy {
            Strategy::Lifo => idle.pop_back(),
            Strategy::Fifo => idle.pop_front(),
        })
    }

    fn restore(&self, worker: Worker) {
        self.with_idle(|idle| {
            if idle.len() < self.settings.size {
                idle.push_back(worker);
            }
            // Overflow workers retire when idle: dropping closes the
            // connection.
        });
    }

    fn with_idle<T>(&self, f: impl FnOnce(&mut VecDeque<Worker>) -> T) -> T {
        let mut guard = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("key", &self.key)
            .field("settings", &self.settings)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
