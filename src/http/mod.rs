//! Request/response types and input normalization.
//!
//! Requests carry a canonical uppercase method token, ordered headers with
//! integer values already coerced to strings, and a byte body. Responses are
//! fully buffered; there is no streaming surface.

pub mod request;
pub mod response;

pub use request::{normalize_headers, normalize_method, HeaderValue, Headers, Request};
pub use response::Response;
