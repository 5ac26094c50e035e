//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 実装は全ての変更操作を単一の排他制御の下で実行しなければなりません。
//! 戻り値のスナップショットは変更と同じクリティカルセクション内で取得されるため、
//! ブロードキャスト対象の決定に使っても競合しません。

use async_trait::async_trait;

use super::{
    entity::{Answer, Connection, RoundLocation},
    error::{RepositoryError, RoomError},
    lobby::{AnswerTarget, Departure, Joined, RoomSnapshot, RoundStarted},
    value_object::{ConnectionId, Coordinate, GameSettings, Nickname, RoomId, Timestamp},
};

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 接続を登録
    async fn register_connection(&self, connection: Connection);

    /// 接続を削除し、所属 Room から退出させる（2 回目以降は `None`）
    async fn unregister_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<(Connection, Option<Departure>)>;

    async fn get_connection(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 接続中の全てのクライアント ID を取得
    async fn get_all_connection_ids(&self) -> Vec<ConnectionId>;

    /// Room を作成（作成者が admin になる）
    ///
    /// `nickname` は作成に成功した場合にだけ接続へ反映される。
    async fn create_room(
        &self,
        room_id: RoomId,
        creator: &ConnectionId,
        nickname: Option<Nickname>,
        settings: GameSettings,
        created_at: Timestamp,
        capacity: usize,
    ) -> Result<RoomSnapshot, RoomError>;

    /// Room に参加（`nickname` は参加に成功した場合にだけ反映される）
    async fn join_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        nickname: Option<Nickname>,
    ) -> Result<Joined, RoomError>;

    /// 所属 Room から退出（未所属なら `None`）
    async fn leave_room(&self, connection_id: &ConnectionId) -> Option<Departure>;

    async fn kick_member(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<Departure, RoomError>;

    async fn start_game(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
    ) -> Result<RoomSnapshot, RoomError>;

    /// 全 Room の一貫したスナップショットを取得
    async fn get_rooms(&self) -> Vec<RoomSnapshot>;

    async fn begin_round(
        &self,
        connection_id: &ConnectionId,
        location: RoundLocation,
        now: Timestamp,
    ) -> Result<RoundStarted, RoomError>;

    async fn replace_pending_locations(
        &self,
        connection_id: &ConnectionId,
        locations: Vec<Coordinate>,
    ) -> Result<RoomId, RoomError>;

    async fn get_answer_target(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<AnswerTarget, RoomError>;

    async fn record_answer(
        &self,
        room_id: &RoomId,
        round: u32,
        answer: Answer,
    ) -> Result<RoomSnapshot, RoomError>;

    /// 期限切れ Room を削除し、削除した Room ID を返す
    async fn remove_expired_rooms(
        &self,
        now: Timestamp,
        ttl_millis: i64,
    ) -> Result<Vec<RoomId>, RepositoryError>;
}
