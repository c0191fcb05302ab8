use crate::base::{Error, TransportError};
use crate::config::ResolvedConnOptions;
use crate::http::Request;
use crate::transport::{Connection, RawResponse, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Pool member owning at most one transport connection to one host:port.
///
/// The pool guarantees exclusive use, so a worker never sees two requests at
/// once. The connection is established lazily inside the request budget and
/// dropped on any failure or timeout, so the owning pool replaces broken
/// connections simply by handing the worker its next request.
pub struct Worker {
    host: String,
    port: u16,
    opts: Arc<ResolvedConnOptions>,
    transport: Arc<dyn Transport>,
    conn: Option<Box<dyn Connection>>,
}

impl Worker {
    pub fn new(
        host: String,
        port: u16,
        opts: Arc<ResolvedConnOptions>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self { host, port, opts, transport, conn: None }
    }

    /// Execute one request, applying `budget` to the whole round trip:
    /// connection reuse or re-establishment, send, and the full response
    /// including trailers. Exceeding it yields [`Error::RequestTimeout`];
    /// the in-flight exchange is abandoned, not aborted.
    pub async fn execute(&mut self, req: Request, budget: Duration) -> Result<RawResponse, Error> {
        match tokio::time::timeout(budget, self.run(req)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(reason)) => {
                self.conn = None;
                Err(Error::Transport(reason))
            }
            Err(_) => {
                self.conn = None;
                Err(Error::RequestTimeout)
            }
        }
    }

    async fn run(&mut self, req: Request) -> Result<RawResponse, TransportError> {
        let live = self.conn.as_ref().is_some_and(|c| c.is_open());
        if !live {
            let conn = self.transport.connect(&self.host, self.port, &self.opts).await?;
            self.conn = Some(conn);
        }
        match self.conn.as_mut() {
            Some(conn) => conn.execute(req).await,
            None => Err(TransportError::new("connection unavailable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConn {
        calls: Arc<AtomicUsize>,
        stall: Option<Duration>,
    }

    impl Connection for CountingConn {
        fn execute(&mut self, _req: Request) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if let Some(stall) = self.stall {
                    tokio::time::sleep(stall).await;
                }
                Ok(RawResponse {
                    status: StatusCode::OK,
                    headers: Vec::new(),
                    body: Bytes::new(),
                    trailers: Vec::new(),
                })
            })
        }

        fn is_open(&self) -> bool {
            true
        }
    }

    struct StubTransport {
        connects: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
        stall: Option<Duration>,
    }

    impl Transport for StubTransport {
        fn connect<'a>(
            &'a self,
            _host: &'a str,
            _port: u16,
            _opts: &'a ResolvedConnOptions,
        ) -> BoxFuture<'a, Result<Box<dyn Connection>, TransportError>> {
            Box::pin(async move {
                self.connects.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(CountingConn { calls: Arc::clone(&self.calls), stall: self.stall })
                    as Box<dyn Connection>)
            })
        }
    }

    fn worker_with(stall: Option<Duration>) -> (Worker, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(StubTransport {
            connects: Arc::clone(&connects),
            calls: Arc::clone(&calls),
            stall,
        });
        let opts = Arc::new(ResolvedConnOptions::defaults_for(crate::config::Scheme::Http));
        (Worker::new("example.com".into(), 80, opts, transport), connects, calls)
    }

    fn get_root() -> Request {
        Request {
            method: "GET".into(),
            path_and_query: "/".into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn connects_lazily_and_reuses_the_connection() {
        let (mut worker, connects, calls) = worker_with(None);
        assert_eq!(connects.load(Ordering::SeqCst), 0);

        worker.execute(get_root(), Duration::from_secs(1)).await.unwrap();
        worker.execute(get_root(), Duration::from_secs(1)).await.unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stalled_exchange_times_out_and_drops_the_connection() {
        let (mut worker, connects, _) = worker_with(Some(Duration::from_secs(60)));

        let err = worker.execute(get_root(), Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err, Error::RequestTimeout);

        // Next request reconnects rather than reusing the abandoned exchange.
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        let err = worker.execute(get_root(), Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err, Error::RequestTimeout);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_unchanged() {
        struct FailingTransport;
        impl Transport for FailingTransport {
            fn connect<'a>(
                &'a self,
                _host: &'a str,
                _port: u16,
                _opts: &'a ResolvedConnOptions,
            ) -> BoxFuture<'a, Result<Box<dyn Connection>, TransportError>> {
                Box::pin(async { Err(TransportError::new("handshake refused")) })
            }
        }

        let opts = Arc::new(ResolvedConnOptions::defaults_for(crate::config::Scheme::Http));
        let mut worker =
            Worker::new("example.com".into(), 80, opts, Arc::new(FailingTransport));
        let err = worker.execute(get_root(), Duration::from_secs(1)).await.unwrap_err();
        match err {
            Error::Transport(t) => assert_eq!(t.reason(), "handshake refused"),
            other => panic!("expected Transport, got {other:?}"),
        }
    }
}
