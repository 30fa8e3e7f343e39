//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Failure Model
//! - `ReplicaError::NotFound` is terminal for one replica
//! - every other `ReplicaError` is retryable by the dispatcher

mod blueprint;
mod dispatch_config;
mod error;
mod query;
mod replica;

pub use blueprint::*;
pub use dispatch_config::*;
pub use error::*;
pub use query::Query;
pub use replica::{LocalReplicaClient, ReplicaClient};

pub use tokio_util::sync::CancellationToken;
