//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 切断時に所属 Room から退出し、最後の 1 人なら Room が削除されること
//! - 同じ接続の切断処理が 2 回目以降は何もしないこと

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, MessagePusher, RoomRepository};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// 所属していた Room からの退出情報（未所属・切断済みなら `None`）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Departure> {
        self.message_pusher.unregister_client(connection_id).await;

        let Some((connection, departure)) =
            self.repository.unregister_connection(connection_id).await
        else {
            tracing::debug!("Connection '{}' was already unregistered", connection_id);
            return None;
        };

        tracing::info!(
            "Connection '{}' ('{}') unregistered",
            connection.id,
            connection.nickname
        );
        if let Some(departure) = &departure {
            if departure.room_deleted() {
                tracing::info!("Room '{}' deleted (last member left)", departure.room_id);
            }
        }
        departure
    }
}
