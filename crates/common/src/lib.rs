//! Wire types and errors shared between the `pwvault` service and its clients.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
