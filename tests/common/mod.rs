//! Shared stub transport for integration tests.
//!
//! Records every connect and execute, tracks the in-flight high-water mark,
//! and can stall or fail on demand, so tests observe pool behavior without
//! any network.

// Not every test binary touches every helper.
#![allow(dead_code)]

use bytes::Bytes;
use futures::future::BoxFuture;
use http::StatusCode;
use manifold::base::TransportError;
use manifold::config::ResolvedConnOptions;
use manifold::http::Request;
use manifold::transport::{Connection, RawResponse, Transport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct StubStats {
    pub connects: AtomicUsize,
    pub executes: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub high_water: AtomicUsize,
    /// (method, path, headers) of every executed request, in completion
    /// submission order.
    pub seen: Mutex<Vec<(String, String, Vec<(String, String)>)>>,
}

impl StubStats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn executes(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

/// Transport whose connections answer 200 with an `x-conn-id` header naming
/// the connection, after an optional stall. `fail_connects` makes the first
/// N connection attempts fail.
#[derive(Clone, Default)]
pub struct StubTransport {
    pub stats: Arc<StubStats>,
    pub stall: Option<Duration>,
    pub fail_connects: usize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stalling(stall: Duration) -> Self {
        Self { stall: Some(stall), ..Self::default() }
    }
}

impl Transport for StubTransport {
    fn connect<'a>(
        &'a self,
        _host: &'a str,
        _port: u16,
        _opts: &'a ResolvedConnOptions,
    ) -> BoxFuture<'a, Result<Box<dyn Connection>, TransportError>> {
        Box::pin(async move {
            let attempt = self.stats.connects.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_connects {
                return Err(TransportError::new("stub connect failure"));
            }
            Ok(Box::new(StubConnection {
                id: attempt,
                stats: Arc::clone(&self.stats),
                stall: self.stall,
            }) as Box<dyn Connection>)
        })
    }
}

pub struct StubConnection {
    id: usize,
    stats: Arc<StubStats>,
    stall: Option<Duration>,
}

impl Connection for StubConnection {
    fn execute(&mut self, req: Request) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        Box::pin(async move {
            self.stats.executes.fetch_add(1, Ordering::SeqCst);
            let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.stats.high_water.fetch_max(now, Ordering::SeqCst);
            self.stats
                .seen
                .lock()
                .unwrap()
                .push((req.method.clone(), req.path_and_query.clone(), req.headers.clone()));

            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }

            self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(RawResponse {
                status: StatusCode::OK,
                headers: vec![("x-conn-id".to_string(), self.id.to_string())],
                body: Bytes::from_static(b"ok"),
                trailers: Vec::new(),
            })
        })
    }

    fn is_open(&self) -> bool {
        true
    }
}
