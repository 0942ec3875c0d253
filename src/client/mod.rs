//! HTTP client wrapper for the backend API

mod http;
pub mod request;

pub use http::{ApiClient, DEFAULT_LOGIN_PATH};
pub use request::{AuthFlow, PendingRequest, RequestOptions};
