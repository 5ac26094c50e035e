//! HTTP API response DTOs.

use serde::Serialize;

use super::websocket::PlayerSummaryDto;

/// Active room as returned by `GET /api/rooms`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummaryDto {
    pub room: String,
    pub player_count: usize,
    pub players: Vec<PlayerSummaryDto>,
    pub started: bool,
    pub round: u32,
    /// RFC 3339
    pub created_at: String,
}
