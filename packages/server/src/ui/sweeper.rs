//! Expiry Sweeper
//!
//! 一定間隔で期限切れ Room を削除するバックグラウンドタスク。
//! 削除はメンバーに通知しない。失敗してもログを残して次の周期に進む。

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use super::state::AppState;

/// Spawn the sweeper. It stops once `shutdown` changes or its sender is dropped.
pub fn spawn_sweeper(
    state: Arc<AppState>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = state.expire_rooms_usecase.execute().await {
                        tracing::error!("Room sweep failed: {}", e);
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("Sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, ConnectionId, GameSettings, Nickname, RoomId, RoomPolicy, RoomRepository, Timestamp},
        infrastructure::{
            location::{HaversineDistance, RandomLocationGenerator},
            message_pusher::WebSocketMessagePusher,
            repository::InMemoryRoomRepository,
        },
    };
    use geoduel_shared::time::FixedClock;

    #[tokio::test]
    async fn test_sweeper_removes_expired_rooms_until_shutdown() {
        // テスト項目: スイーパーは期限切れの Room を削除し、シャットダウンで停止する
        // given (前提条件): TTL 0 なので作成直後から期限切れ
        let repository = Arc::new(InMemoryRoomRepository::new());
        let state = Arc::new(AppState::new(
            repository.clone(),
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(FixedClock::new(0)),
            Arc::new(RandomLocationGenerator),
            Arc::new(HaversineDistance),
            RoomPolicy {
                ttl: Duration::ZERO,
                ..RoomPolicy::default()
            },
        ));
        let creator = ConnectionId::generate();
        repository
            .register_connection(Connection::new(
                creator,
                Nickname::new("alice".to_string()).unwrap(),
                Timestamp::new(0),
            ))
            .await;
        repository
            .create_room(
                RoomId::new("A1".to_string()).unwrap(),
                &creator,
                None,
                GameSettings::default(),
                Timestamp::new(0),
                10,
            )
            .await
            .unwrap();
        let (stop_tx, stop_rx) = watch::channel(false);

        // when (操作):
        let handle = spawn_sweeper(state, Duration::from_millis(10), stop_rx);
        time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(true).unwrap();

        // then (期待する結果):
        assert!(repository.get_rooms().await.is_empty());
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
