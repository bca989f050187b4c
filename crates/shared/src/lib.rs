//! Shared types for the socialnet client and anything that speaks its wire format.

pub mod error;
pub mod models;
pub mod protocol;

pub use error::*;
pub use models::*;
pub use protocol::*;
