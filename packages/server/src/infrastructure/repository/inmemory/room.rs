//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `Lobby` 集約を 1 つの `RwLock` で保護し、全ての変更操作を直列化します。
//! 一覧取得は read lock で実行されるため、書き込み途中の状態は観測されません。
//!
//! ロックを保持するのはメモリ上の状態遷移の間だけで、await を挟む処理
//! （外部 API 呼び出しなど）をロック内で行ってはいけません。

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Answer, AnswerTarget, Connection, ConnectionId, Coordinate, Departure, GameSettings, Joined,
    Lobby, Nickname, RepositoryError, RoomError, RoomId, RoomRepository, RoomSnapshot,
    RoundLocation, RoundStarted, Timestamp,
};

/// 期限切れ掃除がロック獲得を諦めるまでの時間
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    lobby: RwLock<Lobby>,
    lock_timeout: Duration,
}

impl InMemoryRoomRepository {
    /// 空の Lobby で InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            lobby: RwLock::new(Lobby::new()),
            lock_timeout,
        }
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn register_connection(&self, connection: Connection) {
        let mut lobby = self.lobby.write().await;
        lobby.register(connection);
    }

    async fn unregister_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<(Connection, Option<Departure>)> {
        let mut lobby = self.lobby.write().await;
        lobby.unregister(connection_id)
    }

    async fn get_connection(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let lobby = self.lobby.read().await;
        lobby.connection(connection_id).cloned()
    }

    async fn get_all_connection_ids(&self) -> Vec<ConnectionId> {
        let lobby = self.lobby.read().await;
        lobby.connection_ids()
    }

    async fn create_room(
        &self,
        room_id: RoomId,
        creator: &ConnectionId,
        nickname: Option<Nickname>,
        settings: GameSettings,
        created_at: Timestamp,
        capacity: usize,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.create_room(room_id, creator, nickname, settings, created_at, capacity)
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        nickname: Option<Nickname>,
    ) -> Result<Joined, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.join_room(room_id, connection_id, nickname)
    }

    async fn leave_room(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let mut lobby = self.lobby.write().await;
        lobby.leave_room(connection_id)
    }

    async fn kick_member(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<Departure, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.kick(room_id, requester, target)
    }

    async fn start_game(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.start_game(room_id, requester)
    }

    async fn get_rooms(&self) -> Vec<RoomSnapshot> {
        let lobby = self.lobby.read().await;
        lobby.rooms().map(RoomSnapshot::from).collect()
    }

    async fn begin_round(
        &self,
        connection_id: &ConnectionId,
        location: RoundLocation,
        now: Timestamp,
    ) -> Result<RoundStarted, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.begin_round(connection_id, location, now)
    }

    async fn replace_pending_locations(
        &self,
        connection_id: &ConnectionId,
        locations: Vec<Coordinate>,
    ) -> Result<RoomId, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.replace_pending_locations(connection_id, locations)
    }

    async fn get_answer_target(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<AnswerTarget, RoomError> {
        let lobby = self.lobby.read().await;
        lobby.answer_target(connection_id)
    }

    async fn record_answer(
        &self,
        room_id: &RoomId,
        round: u32,
        answer: Answer,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut lobby = self.lobby.write().await;
        lobby.record_answer(room_id, round, answer)
    }

    async fn remove_expired_rooms(
        &self,
        now: Timestamp,
        ttl_millis: i64,
    ) -> Result<Vec<RoomId>, RepositoryError> {
        let mut lobby = tokio::time::timeout(self.lock_timeout, self.lobby.write())
            .await
            .map_err(|_| RepositoryError::LockTimeout(self.lock_timeout))?;
        Ok(lobby.remove_expired(now, ttl_millis))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Lobby への委譲が正しく行われること
    // - 並行した変更操作が直列化され、定員や整合性が崩れないこと
    // - 期限切れ掃除がロックを獲得できない場合にタイムアウトすること
    // ========================================

    async fn connect(repo: &InMemoryRoomRepository, nickname: &str) -> ConnectionId {
        let id = ConnectionId::generate();
        repo.register_connection(Connection::new(
            id,
            Nickname::new(nickname.to_string()).unwrap(),
            Timestamp::new(0),
        ))
        .await;
        id
    }

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_rooms() {
        // テスト項目: 作成した Room が一覧に現れる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let alice = connect(&repo, "alice").await;

        // when (操作):
        repo.create_room(
            room_id("A1"),
            &alice,
            None,
            GameSettings::default(),
            Timestamp::new(0),
            10,
        )
        .await
        .unwrap();
        let rooms = repo.get_rooms().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, room_id("A1"));
        assert_eq!(rooms[0].member_ids(), vec![alice]);
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_exceed_capacity() {
        // テスト項目: 同時に多数の参加が来ても定員を超えない
        // given (前提条件):
        let repo = Arc::new(InMemoryRoomRepository::new());
        let admin = connect(&repo, "admin").await;
        repo.create_room(
            room_id("A1"),
            &admin,
            None,
            GameSettings::default(),
            Timestamp::new(0),
            10,
        )
        .await
        .unwrap();
        let mut ids = Vec::new();
        for i in 0..30 {
            ids.push(connect(&repo, &format!("p{i}")).await);
        }

        // when (操作):
        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.join_room(&room_id("A1"), &id, None).await })
            })
            .collect();
        let mut joined = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => joined += 1,
                Err(RoomError::RoomFull(_)) => full += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // then (期待する結果):
        assert_eq!(joined, 9);
        assert_eq!(full, 21);
        assert_eq!(repo.get_rooms().await[0].members.len(), 10);
    }

    #[tokio::test]
    async fn test_remove_expired_rooms_times_out_when_lock_is_held() {
        // テスト項目: ロックが解放されない場合、掃除はタイムアウトエラーを返す
        // given (前提条件):
        let repo = InMemoryRoomRepository::with_lock_timeout(Duration::from_millis(20));
        let _reader = repo.lobby.read().await;

        // when (操作):
        let result = repo.remove_expired_rooms(Timestamp::new(0), 0).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::LockTimeout(Duration::from_millis(20)))
        );
    }

    #[tokio::test]
    async fn test_unregister_connection_twice() {
        // テスト項目: 同じ接続の登録解除は 2 回目以降 None になる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let alice = connect(&repo, "alice").await;

        // when (操作):
        let first = repo.unregister_connection(&alice).await;
        let second = repo.unregister_connection(&alice).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(repo.get_connection(&alice).await.is_none());
    }
}
