//! Client side: relay connection and the replica cache it feeds

pub mod cache;
pub mod connection;

pub use cache::{Replica, ReplicaCache};
pub use connection::{ClientError, RelayClient};
