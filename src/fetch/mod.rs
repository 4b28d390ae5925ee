//! Request/response model and network access.
//!
//! This module owns the shapes that flow through the worker:
//! - `Request`/`Response` descriptors for intercepted resource loads
//! - the `Network` trait the router fetches through, with a reqwest-backed
//!   production implementation

mod client;
mod types;

pub use client::{HttpNetwork, Network};
pub use types::{Destination, Method, Request, Response, ResponseKind};
