//! MessagePusher trait 定義
//!
//! クライアントへのメッセージ送信（Broadcast Router）の抽象化。
//! 送信は全て fire-and-forget で、切断済みの宛先は黙って読み飛ばされます。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// 接続ごとの送信キュー（FIFO）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信キューを登録
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel);

    /// クライアントの送信キューを登録解除
    async fn unregister_client(&self, client_id: &ConnectionId);

    /// 1 つの接続へ送信
    async fn push_to(&self, client_id: &ConnectionId, content: &str)
    -> Result<(), MessagePushError>;

    /// 指定した接続へ送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 全ての接続へ送信
    async fn broadcast_all(&self, content: &str) -> Result<(), MessagePushError>;
}
