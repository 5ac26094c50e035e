//! UseCase: Room 退出処理

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, RoomId, RoomRepository};

/// Room 退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl LeaveRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 退出を実行（エラーにはならない）
    ///
    /// 接続が `room_id` に所属していない場合は何もしない。
    pub async fn execute(&self, connection_id: &ConnectionId, room_id: &RoomId) -> Option<Departure> {
        let current = self
            .repository
            .get_connection(connection_id)
            .await
            .and_then(|c| c.room);
        if current.as_ref() != Some(room_id) {
            tracing::debug!(
                "Ignoring leave of '{}' from '{}' (current room: {:?})",
                connection_id,
                room_id,
                current
            );
            return None;
        }

        let departure = self.repository.leave_room(connection_id).await?;
        if departure.room_deleted() {
            tracing::info!("Room '{}' deleted (last member left)", departure.room_id);
        }
        Some(departure)
    }
}
