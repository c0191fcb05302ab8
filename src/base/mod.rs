//! Base types and error handling.
//!
//! - [`Error`]: every terminal failure a dispatched request can end in
//! - [`TransportError`]: opaque reason carried up from the connection layer

pub mod error;

pub use error::{Error, TransportError};
