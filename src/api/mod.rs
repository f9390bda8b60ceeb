//! Client side of the backend REST API.
//!
//! [`ApiGateway`] is the only component that talks HTTP. It attaches the
//! bearer token, decodes JSON, and turns 401/403/422 into a forced logout.

mod client;
mod error;
pub mod payload;
mod transport;

pub use client::{json_body, ApiGateway, ApiResponse};
pub use error::{is_auth_failure, ApiError, AUTH_FAILURE_STATUSES};
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport};
