//! HTTP surface of the identity and profile services.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
