//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_request_gateway;
mod in_memory_location;
mod in_memory_request_gateway;

pub use http_request_gateway::{ACTING_USER_HEADER, DEFAULT_API_BASE_URL, HttpRequestGateway};
pub use in_memory_location::InMemoryLocation;
pub use in_memory_request_gateway::InMemoryRequestGateway;
