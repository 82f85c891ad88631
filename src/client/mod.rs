//! HTTP client for the backoffice backend

pub mod http;
pub mod request;

pub use http::AuthenticatedClient;
pub use request::RequestDescriptor;
