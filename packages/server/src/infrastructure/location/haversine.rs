//! Great-circle distance used when no directions service is configured.
//!
//! Walking paths are never shorter than the great-circle distance, so this is
//! a lower bound of what a directions API would report.

use async_trait::async_trait;

use crate::domain::{Coordinate, DistanceError, DistanceLookup};

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl HaversineDistance {
    pub fn distance_m(from: Coordinate, to: Coordinate) -> f64 {
        let (lat1, lat2) = (from.lat().to_radians(), to.lat().to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (to.lng() - from.lng()).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

#[async_trait]
impl DistanceLookup for HaversineDistance {
    async fn walking_distance(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<f64, DistanceError> {
        Ok(Self::distance_m(from, to))
    }
}
