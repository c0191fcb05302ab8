//! Per-group static configuration and the provider seam.
//!
//! The dispatcher never reads ambient global state: it is constructed with a
//! [`ConfigProvider`] and asks it for the [`GroupConfig`] of a pool group at
//! dispatch time. [`StaticConfig`] is the in-memory implementation; the
//! serde-friendly [`GroupSettings`] mirror exists so group tables can be
//! loaded from JSON config files.

use crate::metrics::{MetricsHook, NoopMetrics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Built-in checkout timeout when neither the call nor the group sets one.
pub const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_millis(1000);
/// Built-in request execution timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// URL scheme accepted by the dispatcher. Determines the default port and
/// the default connection options; it is not part of the pool key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Checkout ordering for a pool's idle workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Most recently returned worker is handed out first.
    #[default]
    Lifo,
    /// Oldest idle worker is handed out first.
    Fifo,
}

/// Wire protocol a transport may negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http1,
    Http2,
}

/// Socket flavor underneath the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Tcp,
    Tls,
}

/// Idle keepalive for a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keepalive {
    /// Never retire the connection for idleness.
    Infinite,
    /// Retire after this many milliseconds idle.
    AfterMs(u64),
}

impl Keepalive {
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Keepalive::Infinite => None,
            Keepalive::AfterMs(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// Caller-supplied connection option overlay. Every field is optional;
/// unset fields fall back to the per-scheme defaults when a pool is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnOptions {
    pub retry: Option<u32>,
    pub keepalive: Option<Keepalive>,
    pub protocols: Option<Vec<Protocol>>,
    pub transport: Option<TransportKind>,
}

impl ConnOptions {
    /// Resolve against the defaults for `scheme`. Caller-set fields win.
    pub fn resolve(&self, scheme: Scheme) -> ResolvedConnOptions {
        let defaults = ResolvedConnOptions::defaults_for(scheme);
        ResolvedConnOptions {
            retry: self.retry.unwrap_or(defaults.retry),
            keepalive: self.keepalive.unwrap_or(defaults.keepalive),
            protocols: self.protocols.clone().unwrap_or(defaults.protocols),
            transport: self.transport.unwrap_or(defaults.transport),
        }
    }
}

/// Fully resolved connection options handed to the transport at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConnOptions {
    pub retry: u32,
    pub keepalive: Keepalive,
    pub protocols: Vec<Protocol>,
    pub transport: TransportKind,
}

impl ResolvedConnOptions {
    /// Zero automatic retries, infinite idle keepalive, protocol list and
    /// socket flavor chosen by scheme.
    pub fn defaults_for(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Http => Self {
                retry: 0,
                keepalive: Keepalive::Infinite,
                protocols: vec![Protocol::Http1],
                transport: TransportKind::Tcp,
            },
            Scheme::Https => Self {
                retry: 0,
                keepalive: Keepalive::Infinite,
                protocols: vec![Protocol::Http2, Protocol::Http1],
                transport: TransportKind::Tls,
            },
        }
    }
}

/// Static configuration for one pool group.
///
/// Read from the provider at dispatch time and never cached by the
/// dispatcher, so provider implementations may serve updated values (new
/// pools pick them up; live pools keep the settings they were created with).
#[derive(Clone)]
pub struct GroupConfig {
    pub pool_size: usize,
    pub pool_max_overflow: usize,
    pub pool_strategy: Strategy,
    /// Group-level checkout timeout; per-call options take precedence.
    pub pool_timeout: Option<Duration>,
    /// Group-level request execution timeout; per-call options take precedence.
    pub request_timeout: Option<Duration>,
    pub conn_opts: ConnOptions,
    /// Emit one structured log event per call, with elapsed time and a
    /// truncated body preview.
    pub log_and_time: bool,
    pub metrics: Arc<dyn MetricsHook>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            pool_max_overflow: 4,
            pool_strategy: Strategy::default(),
            pool_timeout: None,
            request_timeout: None,
            conn_opts: ConnOptions::default(),
            log_and_time: false,
            metrics: Arc::new(NoopMetrics),
        }
    }
}

impl std::fmt::Debug for GroupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupConfig")
            .field("pool_size", &self.pool_size)
            .field("pool_max_overflow", &self.pool_max_overflow)
            .field("pool_strategy", &self.pool_strategy)
            .field("pool_timeout", &self.pool_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("conn_opts", &self.conn_opts)
            .field("log_and_time", &self.log_and_time)
            .finish_non_exhaustive()
    }
}

/// Serde mirror of [`GroupConfig`] for file-driven configuration.
/// Durations are integer milliseconds; the metrics hook cannot be expressed
/// in a file and is attached after loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    pub pool_size: Option<usize>,
    pub pool_max_overflow: Option<usize>,
    pub pool_strategy: Option<Strategy>,
    pub pool_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub conn_opts: ConnOptions,
    pub log_and_time: Option<bool>,
}

impl GroupSettings {
    /// Materialize into a [`GroupConfig`], filling unset fields with the
    /// built-in defaults and the given metrics hook.
    pub fn into_config(self, metrics: Arc<dyn MetricsHook>) -> GroupConfig {
        let base = GroupConfig::default();
        GroupConfig {
            pool_size: self.pool_size.unwrap_or(base.pool_size),
            pool_max_overflow: self.pool_max_overflow.unwrap_or(base.pool_max_overflow),
            pool_strategy: self.pool_strategy.unwrap_or(base.pool_strategy),
            pool_timeout: self.pool_timeout_ms.map(Duration::from_millis),
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
            conn_opts: self.conn_opts,
            log_and_time: self.log_and_time.unwrap_or(base.log_and_time),
            metrics,
        }
    }
}

/// Provides the [`GroupConfig`] for a named pool group.
///
/// Injected into the dispatcher at construction so there is no hidden
/// process-wide configuration state.
pub trait ConfigProvider: Send + Sync {
    fn group(&self, name: &str) -> GroupConfig;
}

/// Fixed table of group configurations with a fallback for unknown groups.
#[derive(Clone, Default)]
pub struct StaticConfig {
    groups: HashMap<String, GroupConfig>,
    fallback: GroupConfig,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the configuration for one group, replacing any previous one.
    pub fn with_group(mut self, name: impl Into<String>, config: GroupConfig) -> Self {
        self.groups.insert(name.into(), config);
        self
    }

    /// Configuration returned for groups with no explicit entry.
    pub fn with_fallback(mut self, config: GroupConfig) -> Self {
        self.fallback = config;
        self
    }
}

impl ConfigProvider for StaticConfig {
    fn group(&self, name: &str) -> GroupConfig {
        self.groups.get(name).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}
