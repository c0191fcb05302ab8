//! Connection-layer contract consumed by the pool core.
//!
//! A [`Transport`] opens connections; a [`Connection`] executes one request
//! at a time against its peer. The core treats both as opaque collaborators:
//! any failure they report travels up unchanged as a
//! [`TransportError`](crate::base::TransportError). [`TcpTransport`] is the
//! bundled plain-TCP HTTP/1 implementation; TLS stays with the caller, who
//! injects their own transport for it.

pub mod tcp;

use crate::base::TransportError;
use crate::config::ResolvedConnOptions;
use crate::http::{Request, Response};
use bytes::Bytes;
use futures::future::BoxFuture;
use http::StatusCode;
use url::Url;

/// Response as produced by a connection. Carries everything except the
/// logical request URL, which the dispatcher attaches after execution.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub trailers: Vec<(String, String)>,
}

impl RawResponse {
    pub fn into_response(self, request_url: Url) -> Response {
        Response {
            request_url,
            status: self.status,
            headers: self.headers,
            body: self.body,
            trailers: self.trailers,
        }
    }
}

/// One live connection to one host:port. Serializes requests; the pool
/// guarantees a connection is never used by two callers at once.
pub trait Connection: Send {
    /// Execute one request and buffer the full response, trailers included.
    fn execute(&mut self, req: Request) -> BoxFuture<'_, Result<RawResponse, TransportError>>;

    /// Whether the connection can still carry a request. A closed connection
    /// makes its worker reconnect before the next execution.
    fn is_open(&self) -> bool;
}

/// Opens connections for workers. Implementations decide what the resolved
/// connection options mean; the core only plumbs them through.
pub trait Transport: Send + Sync {
    fn connect<'a>(
        &'a self,
        host: &'a str,
        port: u16,
        opts: &'a ResolvedConnOptions,
    ) -> BoxFuture<'a, Result<Box<dyn Connection>, TransportError>>;
}

pub use tcp::TcpTransport;
