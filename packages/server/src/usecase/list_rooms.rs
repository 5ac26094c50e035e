//! UseCase: アクティブな Room 一覧の取得

use std::sync::Arc;

use geoduel_shared::time::Clock;

use crate::domain::{RoomPolicy, RoomRepository, RoomSnapshot, Timestamp};

/// Room 一覧取得のユースケース
///
/// TTL に達した Room は、スイーパーが削除する前でも一覧に含めない。
pub struct ListRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
    policy: RoomPolicy,
}

impl ListRoomsUseCase {
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

    /// 作成日時の古い順に返す
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        let now = Timestamp::new(self.clock.now_millis());
        let ttl_millis = self.policy.ttl_millis();

        let mut rooms: Vec<RoomSnapshot> = self
            .repository
            .get_rooms()
            .await
            .into_iter()
            .filter(|room| room.created_at.elapsed_until(now) < ttl_millis)
            .collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rooms
    }
}
