//! Infrastructure layer: configuration, identity provider adapters, the
//! Profile Store, and the cross-store orchestration built on top of them.

pub mod config;
pub mod idp;
pub mod profile;
pub mod saga;
pub mod sync;
