//! UseCase: プレイヤーのキック処理

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, RoomError, RoomId, RoomRepository};

/// キックのユースケース（admin のみ実行可能）
pub struct KickPlayerUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl KickPlayerUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<Departure, RoomError> {
        let departure = self
            .repository
            .kick_member(room_id, requester, target)
            .await?;
        tracing::info!(
            "'{}' was kicked from room '{}' by '{}'",
            departure.member.nickname,
            room_id,
            requester
        );
        Ok(departure)
    }
}
