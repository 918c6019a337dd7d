/*
[INPUT]:  HTTP client configuration and engine endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod session;

pub use error::{AuthError, ErrorKind, Result};

pub use client::{ClientConfig, ENGINE_URL, SessionApiClient};
