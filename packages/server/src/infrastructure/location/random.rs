//! Uniformly random challenge locations.

use rand::Rng;

use crate::domain::{Coordinate, LocationGenerator};

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomLocationGenerator;

impl LocationGenerator for RandomLocationGenerator {
    fn generate(&self) -> Coordinate {
        let mut rng = rand::rng();
        let lat = rng.random_range(-90.0..90.0);
        let lng = rng.random_range(-180.0..180.0);
        // Half-open ranges always satisfy the coordinate bounds.
        Coordinate::new(lat, lng).unwrap_or_default()
    }
}
