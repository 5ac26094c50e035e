//! Conversion logic between DTOs and domain entities.

use geoduel_shared::time::timestamp_to_rfc3339;

use crate::domain::{Member, RoomId, RoomSnapshot};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Member> for dto::PlayerDto {
    fn from(member: &Member) -> Self {
        Self {
            id: member.connection_id.to_string(),
            nickname: member.nickname.to_string(),
            admin: member.is_admin,
        }
    }
}

impl From<&Member> for dto::PlayerSummaryDto {
    fn from(member: &Member) -> Self {
        Self {
            nickname: member.nickname.to_string(),
            admin: member.is_admin,
        }
    }
}

impl From<&RoomSnapshot> for dto::RoomListingDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            room: room.id.to_string(),
            player_count: room.members.len(),
            players: room.members.iter().map(Into::into).collect(),
        }
    }
}

impl From<&RoomSnapshot> for http::RoomSummaryDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            room: room.id.to_string(),
            player_count: room.members.len(),
            players: room.members.iter().map(Into::into).collect(),
            started: room.started,
            round: room.round,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

/// `update_player_list` event for the given membership.
pub fn player_list_event(room_id: &RoomId, members: &[Member]) -> dto::ServerEvent {
    dto::ServerEvent::UpdatePlayerList {
        room: room_id.to_string(),
        players: members.iter().map(Into::into).collect(),
    }
}
