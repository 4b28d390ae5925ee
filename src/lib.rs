//! Offline cache controller for the PathPatrol complaint-reporting app.
//!
//! Intercepts outbound resource requests on behalf of a host event loop,
//! serves them cache-first from a versioned store with network fallback,
//! substitutes a precached offline document for failed navigations, and
//! handles push notifications, notification clicks, and deferred
//! resynchronization of complaints submitted while offline.

pub mod config;
pub mod event;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
pub mod router;
pub mod store;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod testutil;

pub use config::Config;
pub use worker::Worker;
