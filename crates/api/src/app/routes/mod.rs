pub mod auth;
pub mod sync;
pub mod system;
pub mod users;
