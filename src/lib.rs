//! # manifold
//!
//! An HTTP client that multiplexes requests over a bounded set of per-host
//! connection pools rather than opening a connection per call.
//!
//! A request is dispatched to the pool for its (group, host, port) key; the
//! pool is created lazily and race-safely on first use, bounds in-flight
//! concurrency to size + max_overflow workers, and applies two independent
//! timeout budgets: the checkout wait and the request execution.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use manifold::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::new();
//!     let response = client.get("http://example.com/").send().await.unwrap();
//!     println!("{} {}", response.status, response.text());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy
//! - [`config`] - Per-group configuration and the provider seam
//! - [`http`] - Request/response types and normalization
//! - [`pool`] - Bounded worker pools, keys, and the lifecycle registry
//! - [`metrics`] - Optional queue-observation hook
//! - [`transport`] - Connection-layer contract and the bundled TCP transport
//! - [`client`] - The dispatcher and its builders

pub mod base;
pub mod client;
pub mod config;
pub mod http;
pub mod metrics;
pub mod pool;
pub mod transport;

pub use crate::base::{Error, TransportError};
pub use crate::client::{Client, ClientBuilder, RequestBuilder, RequestOptions};
pub use crate::config::{ConfigProvider, ConnOptions, GroupConfig, StaticConfig, Strategy};
pub use crate::http::{HeaderValue, Response};
pub use crate::metrics::{MetricsHook, NoopMetrics, PoolStatus};
