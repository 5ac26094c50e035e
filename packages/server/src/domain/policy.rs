//! Room limits shared by the use cases.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    /// Maximum members per room.
    pub capacity: usize,
    /// Rooms older than this are hidden from listings and swept.
    pub ttl: Duration,
    /// Upper bound for `pre_generate_locations`.
    pub max_pre_generated: usize,
}

impl RoomPolicy {
    pub fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            capacity: 10,
            ttl: Duration::from_secs(3600),
            max_pre_generated: 50,
        }
    }
}
