//! Bundled plain-TCP HTTP/1.1 transport built on hyper's connection API.

use crate::base::TransportError;
use crate::config::{Protocol, ResolvedConnOptions, TransportKind};
use crate::http::Request;
use crate::transport::{Connection, RawResponse, Transport};
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Plain-TCP transport speaking HTTP/1.1 via `hyper::client::conn::http1`.
///
/// Rejects `TransportKind::Tls` and protocol lists without `Http1`; HTTPS
/// callers inject their own [`Transport`] implementation instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for TcpTransport {
    fn connect<'a>(
        &'a self,
        host: &'a str,
        port: u16,
        opts: &'a ResolvedConnOptions,
    ) -> BoxFuture<'a, Result<Box<dyn Connection>, TransportError>> {
        Box::pin(async move {
            if opts.transport == TransportKind::Tls {
                return Err(TransportError::new(
                    "tls is not handled by the bundled tcp transport",
                ));
            }
            if !opts.protocols.contains(&Protocol::Http1) {
                return Err(TransportError::new("only http/1.1 is supported"));
            }

            let stream = TcpStream::connect((host, port))
                .await
                .map_err(TransportError::from)?;
            let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
                .await
                .map_err(|e| TransportError::new(e.to_string()))?;

            // Drives the connection until the sender is dropped or the peer
            // goes away.
            let driver = tokio::spawn(async move {
                let _ = conn.await;
            });

            let authority =
                if port == 80 { host.to_string() } else { format!("{host}:{port}") };
            Ok(Box::new(H1Connection { sender, authority, driver }) as Box<dyn Connection>)
        })
    }
}

struct H1Connection {
    sender: hyper::client::conn::http1::SendRequest<Full<Bytes>>,
    authority: String,
    driver: JoinHandle<()>,
}

impl Connection for H1Connection {
    fn execute(&mut self, req: Request) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        Box::pin(async move {
            let method = http::Method::from_bytes(req.method.as_bytes())
                .map_err(|e| TransportError::new(e.to_string()))?;

            let mut builder = http::Request::builder()
                .method(method)
                .uri(req.path_and_query.as_str());
            let has_host = req.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("host"));
            if !has_host {
                builder = builder.header(http::header::HOST, self.authority.as_str());
            }
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let request = builder
                .body(Full::new(req.body))
                .map_err(|e| TransportError::new(e.to_string()))?;

            self.sender
                .ready()
                .await
                .map_err(|e| TransportError::new(e.to_string()))?;
            let response = self
                .sender
                .send_request(request)
                .await
                .map_err(|e| TransportError::new(e.to_string()))?;

            let (parts, body) = response.into_parts();
            let collected = body
                .collect()
                .await
                .map_err(|e| TransportError::new(e.to_string()))?;
            let trailers = collected.trailers().map(header_pairs).unwrap_or_default();

            Ok(RawResponse {
                status: parts.status,
                headers: header_pairs(&parts.headers),
                body: collected.to_bytes(),
                trailers,
            })
        })
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl Drop for H1Connection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn header_pairs(map: &http::HeaderMap) -> Vec<(String, String)> {
    map.iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scheme;

    #[tokio::test]
    async fn rejects_tls_transport_kind() {
        let opts = ResolvedConnOptions::defaults_for(Scheme::Https);
        let err = TcpTransport::new().connect("localhost", 443, &opts).await.err();
        assert!(err.is_some_and(|e| e.reason().contains("tls")));
    }

    #[tokio::test]
    async fn connect_to_closed_port_reports_transport_error() {
        // Bind then drop to get a port nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let opts = ResolvedConnOptions::defaults_for(Scheme::Http);
        let result = TcpTransport::new().connect("127.0.0.1", port, &opts).await;
        assert!(result.is_err());
    }
}
