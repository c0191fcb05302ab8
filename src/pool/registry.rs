use crate::base::Error;
use crate::config::{GroupConfig, Scheme};
use crate::pool::{Pool, PoolKey, PoolSettings};
use crate::transport::Transport;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Lifecycle manager: maps a [`PoolKey`] to its one running [`Pool`].
///
/// Creation is an atomic insert-if-absent on the concurrent map, so callers
/// racing to create the same key all end up on the single pool the first
/// writer installed. An existing pool's configuration is never changed by a
/// later `ensure`; a mismatch between the live settings and the caller's
/// freshly resolved ones is logged and otherwise ignored.
pub struct PoolRegistry {
    pools: DashMap<PoolKey, Arc<Pool>>,
    transport: Arc<dyn Transport>,
}

impl PoolRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { pools: DashMap::new(), transport }
    }

    /// The pool registered under `key`, creating it from `config` if absent.
    pub fn ensure(
        &self,
        key: PoolKey,
        scheme: Scheme,
        config: &GroupConfig,
    ) -> Result<Arc<Pool>, Error> {
        let settings = PoolSettings {
            size: config.pool_size,
            max_overflow: config.pool_max_overflow,
            strategy: config.pool_strategy,
            conn_opts: config.conn_opts.resolve(scheme),
        };
        match self.pools.entry(key) {
            Entry::Occupied(entry) => {
                let pool = entry.get();
                if *pool.settings() != settings {
                    tracing::warn!(
                        pool = %pool.name(),
                        live = ?pool.settings(),
                        requested = ?settings,
                        "pool already running with different settings; keeping the live ones"
                    );
                }
                Ok(Arc::clone(pool))
            }
            Entry::Vacant(entry) => {
                let pool = Arc::new(Pool::new(
                    entry.key().clone(),
                    settings,
                    Arc::clone(&self.transport),
                )?);
                entry.insert(Arc::clone(&pool));
                tracing::debug!(pool = %pool.name(), "created pool");
                Ok(pool)
            }
        }
    }

    pub fn get(&self, key: &PoolKey) -> Option<Arc<Pool>> {
        self.pools.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
