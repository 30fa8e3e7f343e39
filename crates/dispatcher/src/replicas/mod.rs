//! Replica implementations
//!
//! Contains MockReplica.

mod mock;

use std::sync::Arc;

use contracts::ClusterBlueprint;

pub use self::mock::MockReplica;

/// Build one MockReplica per configured replica, in configuration order
pub fn mock_replicas(blueprint: &ClusterBlueprint) -> Vec<Arc<MockReplica>> {
    blueprint
        .replicas
        .iter()
        .map(|config| Arc::new(MockReplica::from_config(config)))
        .collect()
}
