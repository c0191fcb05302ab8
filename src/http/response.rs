use bytes::Bytes;
use http::StatusCode;
use url::Url;

/// Fully buffered response for one dispatched request.
///
/// Workers populate every field except `request_url`, which the dispatcher
/// fills in after execution (a worker only knows its host and the request
/// path, not the logical URL).
#[derive(Debug, Clone)]
pub struct Response {
    pub request_url: Url,
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub trailers: Vec<(String, String)>,
}

impl Response {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
