//! UseCase: クライアント接続処理
//!
//! 接続ごとに ID とランダムなニックネームを払い出し、接続レジストリと
//! MessagePusher の両方に登録します。

use std::sync::Arc;

use geoduel_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, MessagePusher, NicknameFactory, PusherChannel, RoomRepository,
    Timestamp,
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectClientUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// 接続を登録し、払い出した Connection を返す
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    pub async fn execute(&self, sender: PusherChannel) -> Connection {
        let connection = Connection::new(
            ConnectionId::generate(),
            NicknameFactory::generate(),
            Timestamp::new(self.clock.now_millis()),
        );

        self.message_pusher
            .register_client(connection.id, sender)
            .await;
        self.repository
            .register_connection(connection.clone())
            .await;

        tracing::info!(
            "Connection '{}' registered as '{}'",
            connection.id,
            connection.nickname
        );
        connection
    }
}
