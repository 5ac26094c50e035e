//! UseCase: ゲーム開始処理

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomError, RoomId, RoomRepository, RoomSnapshot};

/// ゲーム開始のユースケース（admin のみ実行可能、再実行も受け付ける）
pub struct StartGameUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl StartGameUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.repository.start_game(room_id, requester).await?;
        tracing::info!("Game started in room '{}'", room_id);
        Ok(room)
    }
}
