//! UseCase: Room 作成処理
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成者が唯一の admin として所属する Room ができる
//! - 異常系：既存の Room ID（既存 Room は一切変更されない）
//! - 異常系：既に別の Room に所属している

use std::sync::Arc;

use geoduel_shared::time::Clock;

use crate::domain::{
    ConnectionId, GameSettings, Nickname, RoomError, RoomId, RoomPolicy, RoomRepository,
    RoomSnapshot, Timestamp,
};

/// Validated `create` request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoomInput {
    pub room_id: RoomId,
    /// Replaces the connection's nickname once the room is created.
    pub nickname: Option<Nickname>,
    pub settings: GameSettings,
}

/// Room 作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
    policy: RoomPolicy,
}

impl CreateRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        clock: Arc<dyn Clock>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            repository,
            clock,
            policy,
        }
    }

    pub async fn execute(
        &self,
        creator: &ConnectionId,
        input: CreateRoomInput,
    ) -> Result<RoomSnapshot, RoomError> {
        let created_at = Timestamp::new(self.clock.now_millis());
        let room = self
            .repository
            .create_room(
                input.room_id,
                creator,
                input.nickname,
                input.settings,
                created_at,
                self.policy.capacity,
            )
            .await?;

        tracing::info!("Room '{}' created by '{}'", room.id, creator);
        Ok(room)
    }
}
