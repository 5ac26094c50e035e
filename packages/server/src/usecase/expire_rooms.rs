//! UseCase: 期限切れ Room の削除
//!
//! スイーパーから定期的に呼ばれる。メンバーが残っている Room も通知なしで削除する。

use std::sync::Arc;

use geoduel_shared::time::Clock;

use crate::domain::{RepositoryError, RoomId, RoomPolicy, RoomRepository, Timestamp};

pub struct ExpireRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
    policy: RoomPolicy,
}

impl ExpireRoomsUseCase {
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

    /// 削除した Room ID を返す
    pub async fn execute(&self) -> Result<Vec<RoomId>, RepositoryError> {
        let now = Timestamp::new(self.clock.now_millis());
        let removed = self
            .repository
            .remove_expired_rooms(now, self.policy.ttl_millis())
            .await?;
        if !removed.is_empty() {
            tracing::info!("Expired {} room(s): {:?}", removed.len(), removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomError;
    use crate::usecase::test_support::{connect, create_room_at, create_test_repository, room_id};
    use geoduel_shared::time::FixedClock;
    use std::time::Duration;

    #[tokio::test]
    async fn test_ttl_zero_sweep_deletes_occupied_room() {
        // テスト項目: TTL 0 のスイープはメンバーがいる Room も削除し、メンバーは未所属に戻る
        // given (前提条件):
        let repository = create_test_repository();
        let policy = RoomPolicy {
            ttl: Duration::ZERO,
            ..RoomPolicy::default()
        };
        let usecase =
            ExpireRoomsUseCase::new(repository.clone(), Arc::new(FixedClock::new(0)), policy);
        let alice = connect(&repository, "alice").await;
        let bob = connect(&repository, "bob").await;
        create_room_at(&repository, "A1", &alice, 0).await;
        repository.join_room(&room_id("A1"), &bob, None).await.unwrap();

        // when (操作):
        let removed = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(removed, vec![room_id("A1")]);
        assert!(repository.get_rooms().await.is_empty());
        assert_eq!(repository.get_connection(&bob).await.unwrap().room, None);
        assert_eq!(
            repository.join_room(&room_id("A1"), &bob, None).await,
            Err(RoomError::NotFound("A1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_sweep_keeps_young_rooms() {
        // テスト項目: TTL に達していない Room は削除されない
        // given (前提条件):
        let repository = create_test_repository();
        let clock = Arc::new(FixedClock::new(0));
        let usecase = ExpireRoomsUseCase::new(
            repository.clone(),
            clock.clone(),
            RoomPolicy::default(),
        );
        let alice = connect(&repository, "alice").await;
        let bob = connect(&repository, "bob").await;
        create_room_at(&repository, "old", &alice, 0).await;
        clock.set(1_800_000);
        create_room_at(&repository, "young", &bob, 1_800_000).await;

        // when (操作): old の作成からちょうど 1 時間後
        clock.set(3_600_000);
        let removed = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(removed, vec![room_id("old")]);
        let rooms = repository.get_rooms().await;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, room_id("young"));
    }
}
