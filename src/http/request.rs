use bytes::Bytes;

/// Header value as supplied by the caller. Integers are accepted for
/// convenience and coerced to their decimal string form during
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Str(String),
    /// Wide enough for every integer width we accept.
    Int(i128),
}

impl HeaderValue {
    /// Decimal string form for integers, the string itself otherwise.
    pub fn into_string(self) -> String {
        match self {
            HeaderValue::Str(s) => s,
            HeaderValue::Int(n) => n.to_string(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Str(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Str(s)
    }
}

impl From<i64> for HeaderValue {
    fn from(n: i64) -> Self {
        HeaderValue::Int(i128::from(n))
    }
}

impl From<i32> for HeaderValue {
    fn from(n: i32) -> Self {
        HeaderValue::Int(i128::from(n))
    }
}

impl From<u32> for HeaderValue {
    fn from(n: u32) -> Self {
        HeaderValue::Int(i128::from(n))
    }
}

impl From<u64> for HeaderValue {
    fn from(n: u64) -> Self {
        HeaderValue::Int(i128::from(n))
    }
}

/// Caller-facing header list: ordered name/value pairs, order preserved on
/// the wire.
pub type Headers = Vec<(String, HeaderValue)>;

/// Fully normalized request handed to a worker. The worker addresses it at
/// its connection's host; the logical URL is the dispatcher's concern.
#[derive(Debug, Clone)]
pub struct Request {
    /// Canonical uppercase token for known verbs; unknown strings unchanged.
    pub method: String,
    pub path_and_query: String,
    /// Normalized pairs, caller order preserved.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Map known verbs to their canonical uppercase token, case-insensitively.
/// Unknown methods pass through unchanged.
pub fn normalize_method(method: &str) -> String {
    const KNOWN: &[&str] = &["HEAD", "GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];
    for verb in KNOWN {
        if method.eq_ignore_ascii_case(verb) {
            return (*verb).to_string();
        }
    }
    method.to_string()
}

/// Coerce every header value to its string form, keeping caller order.
pub fn normalize_headers(headers: Headers) -> Vec<(String, String)> {
    headers.into_iter().map(|(name, value)| (name, value.into_string())).collect()
}
