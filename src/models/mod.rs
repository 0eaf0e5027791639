//! Data models for the library API.
//!
//! Field names are snake_case on the wire.

mod book;
mod loan;
pub mod rules;
mod user;

pub use book::*;
pub use loan::*;
pub use user::*;
