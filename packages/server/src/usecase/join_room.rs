//! UseCase: Room 参加処理

use std::sync::Arc;

use crate::domain::{ConnectionId, Joined, Nickname, RoomError, RoomId, RoomRepository};

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Joined)` - 追加されたメンバーと参加直後の Room
    /// * `Err(RoomError)` - `NotFound` / `RoomFull` / `AlreadyInRoom`
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        nickname: Option<Nickname>,
    ) -> Result<Joined, RoomError> {
        let joined = self
            .repository
            .join_room(room_id, connection_id, nickname)
            .await?;
        tracing::info!(
            "'{}' joined room '{}' ({} members)",
            joined.member.nickname,
            room_id,
            joined.room.members.len()
        );
        Ok(joined)
    }
}
