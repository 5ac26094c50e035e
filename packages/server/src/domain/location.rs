//! Collaborators for the round coordinator: challenge location generation and
//! the external distance lookup.

use async_trait::async_trait;

use super::{error::DistanceError, value_object::Coordinate};

#[cfg_attr(test, mockall::automock)]
pub trait LocationGenerator: Send + Sync {
    /// A challenge location with lat in [-90, 90) and lng in [-180, 180).
    fn generate(&self) -> Coordinate;
}

/// Walking-path length between two points, provided by an external service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DistanceLookup: Send + Sync {
    async fn walking_distance(&self, from: Coordinate, to: Coordinate)
    -> Result<f64, DistanceError>;
}
