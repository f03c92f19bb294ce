//! `idsync-core`: domain foundation shared by the identity and profile services.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{IdentityId, ProfileId};
pub use value_object::{Email, ValueObject, emails_match};
