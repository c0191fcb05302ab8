//! The dispatcher: single entry point for issuing requests.
//!
//! Validates and normalizes the call, resolves the pool key and the two
//! timeout budgets, creates the pool lazily on first use, and runs
//! checkout + execution, translating every failure into one
//! [`Error`](crate::base::Error) variant.
//!
//! # Example
//!
//! ```rust,ignore
//! use manifold::Client;
//!
//! let client = Client::new();
//! let resp = client.get("http://example.com/status")
//!     .header("x-request-id", 7)
//!     .send()
//!     .await?;
//! println!("{}", resp.status);
//! ```

use crate::base::Error;
use crate::config::{
    ConfigProvider, GroupConfig, Scheme, StaticConfig, DEFAULT_POOL_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::http::{normalize_headers, normalize_method, HeaderValue, Headers, Request, Response};
use crate::pool::{Pool, PoolKey, PoolRegistry};
use crate::transport::{TcpTransport, Transport};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Most characters of a body ever included in a `log_and_time` event.
const BODY_PREVIEW_LIMIT: usize = 1024;

/// Per-call options. Anything set here takes precedence over the group's
/// static configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Pool group the request belongs to; "default" when unset.
    pub pool_group: Option<String>,
    /// Max wait to obtain a worker before [`Error::PoolTimeout`].
    pub pool_timeout: Option<Duration>,
    /// Max wall-clock duration for execution once a worker is held.
    pub request_timeout: Option<Duration>,
}

/// Pooled HTTP client. Cheap to clone; clones share the pool registry.
#[derive(Clone)]
pub struct Client {
    registry: Arc<PoolRegistry>,
    config: Arc<dyn ConfigProvider>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Client with the bundled TCP transport and all-default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Start building a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.prepare("HEAD", url)
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.prepare("GET", url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.prepare("POST", url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.prepare("PUT", url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.prepare("DELETE", url)
    }

    /// Start building a request with an arbitrary method.
    pub fn prepare<M: Into<String>, U: AsRef<str>>(&self, method: M, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method: method.into(),
            url: url.as_ref().to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
            options: RequestOptions::default(),
        }
    }

    /// Number of live pools (one per distinct pool key seen so far).
    pub fn pool_count(&self) -> usize {
        self.registry.len()
    }

    /// Issue one request. The generic surface every verb wrapper routes
    /// through.
    ///
    /// No I/O happens before the URL validates. Timeout precedence for both
    /// budgets is per-call option, then group config, then the built-in
    /// defaults (checkout 1000 ms, request 5000 ms).
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        body: impl Into<Bytes>,
        headers: Headers,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let target = parse_target(url)?;
        let method = normalize_method(method);
        let headers = normalize_headers(headers);

        let group = options.pool_group.as_deref().unwrap_or("default");
        let config = self.config.group(group);
        let pool_timeout = options
            .pool_timeout
            .or(config.pool_timeout)
            .unwrap_or(DEFAULT_POOL_TIMEOUT);
        let request_timeout = options
            .request_timeout
            .or(config.request_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let key = PoolKey::new(group, target.host.clone(), target.port);
        let pool = self.registry.ensure(key, target.scheme, &config)?;

        let req = Request {
            method,
            path_and_query: target.path_and_query,
            headers,
            body: body.into(),
        };

        if config.log_and_time {
            let preview = body_preview(&req.body);
            let started = Instant::now();
            let result = self
                .dispatch(&pool, &config, req, pool_timeout, request_timeout, &target.url)
                .await;
            let elapsed_s = started.elapsed().as_secs_f64();
            match &result {
                Ok(_) => tracing::info!(
                    url = %target.url,
                    body = %preview,
                    elapsed_s,
                    "request completed"
                ),
                Err(error) => tracing::warn!(
                    url = %target.url,
                    body = %preview,
                    elapsed_s,
                    error = %error,
                    "request failed"
                ),
            }
            result
        } else {
            self.dispatch(&pool, &config, req, pool_timeout, request_timeout, &target.url)
                .await
        }
    }

    async fn dispatch(
        &self,
        pool: &Pool,
        config: &GroupConfig,
        req: Request,
        pool_timeout: Duration,
        request_timeout: Duration,
        url: &Url,
    ) -> Result<Response, Error> {
        let token =
            config
                .metrics
                .on_queue(pool.name(), pool.status(), &req.method, &req.path_and_query);
        match pool.execute(req, pool_timeout, request_timeout).await {
            Ok(raw) => Ok(raw.into_response(url.clone())),
            Err(Error::PoolTimeout) => {
                config.metrics.on_queue_timeout(token);
                Err(Error::PoolTimeout)
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("pools", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<Arc<dyn ConfigProvider>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Inject the configuration provider consulted at dispatch time.
    pub fn config(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.config = Some(Arc::new(provider));
        self
    }

    /// Inject the transport new pools hand to their workers. Defaults to the
    /// bundled plain-TCP HTTP/1 transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Client {
        let transport = self.transport.unwrap_or_else(|| Arc::new(TcpTransport::new()));
        let config = self.config.unwrap_or_else(|| Arc::new(StaticConfig::new()));
        Client { registry: Arc::new(PoolRegistry::new(transport)), config }
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: String,
    url: String,
    headers: Headers,
    body: Bytes,
    options: RequestOptions,
}

impl RequestBuilder {
    /// Append a header. Integer values are coerced to decimal strings.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.body = Bytes::from(bytes);
            self.headers
                .push(("content-type".to_string(), "application/json".into()));
        }
        self
    }

    /// Route through a named pool group instead of "default".
    pub fn pool_group(mut self, group: impl Into<String>) -> Self {
        self.options.pool_group = Some(group.into());
        self
    }

    /// Override the checkout timeout for this call.
    pub fn pool_timeout(mut self, timeout: Duration) -> Self {
        self.options.pool_timeout = Some(timeout);
        self
    }

    /// Override the execution timeout for this call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    /// Dispatch the request.
    pub async fn send(self) -> Result<Response, Error> {
        self.client
            .request(&self.method, &self.url, self.body, self.headers, self.options)
            .await
    }
}

#[derive(Debug)]
struct Target {
    url: Url,
    scheme: Scheme,
    host: String,
    port: u16,
    path_and_query: String,
}

fn parse_target(input: &str) -> Result<Target, Error> {
    let url = Url::parse(input).map_err(|e| match e {
        // Scheme-less input parses as a relative reference.
        url::ParseError::RelativeUrlWithoutBase => Error::BadUrlScheme(input.to_string()),
        _ => Error::BadUrl(input.to_string()),
    })?;
    let scheme = match url.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        _ => return Err(Error::BadUrlScheme(input.to_string())),
    };
    let host = url
        .host_str()
        .ok_or_else(|| Error::BadUrl(input.to_string()))?
        .to_string();
    let port = url.port().unwrap_or_else(|| scheme.default_port());
    let path_and_query = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    Ok(Target { url, scheme, host, port, path_and_query })
}

fn body_preview(body: &Bytes) -> String {
    String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_LIMIT).collect()
}
