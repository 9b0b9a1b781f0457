//! Core types for Warden

mod role;
mod user;

pub use role::*;
pub use user::*;
