//! UseCase: チャットメッセージ送信処理
//!
//! メッセージ本文は解釈せず、送信者の情報だけを解決する。
//! 配信先は全ての接続（Room に関係なく）。

use std::sync::Arc;

use crate::domain::{Connection, ConnectionId, RoomError, RoomRepository};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl SendMessageUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 送信者の Connection を返す
    pub async fn execute(&self, sender: &ConnectionId) -> Result<Connection, RoomError> {
        self.repository
            .get_connection(sender)
            .await
            .ok_or_else(|| RoomError::ConnectionNotFound(sender.to_string()))
    }
}
