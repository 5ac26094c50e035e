//! Broadcast Router
//!
//! `ServerEvent` を JSON にして MessagePusher に渡す。送信の失敗はログに残すだけで、
//! 呼び出し元にはエラーを返さない。
//!
//! 状態の変更とその配信は [`BroadcastRouter::sequence`] のガードを保持したまま
//! 行う。これにより、異なる接続から来たイベントでも変更が確定した順に配信される。

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    domain::{ConnectionId, MessagePusher},
    infrastructure::dto::websocket::ServerEvent,
};

pub struct BroadcastRouter {
    message_pusher: Arc<dyn MessagePusher>,
    order: Mutex<()>,
}

impl BroadcastRouter {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            message_pusher,
            order: Mutex::new(()),
        }
    }

    /// Take the delivery-order guard.
    ///
    /// Hold it from the state change until its last push. Never hold it while
    /// waiting on anything outside the process.
    pub async fn sequence(&self) -> MutexGuard<'_, ()> {
        self.order.lock().await
    }

    /// 1 つの接続へ送信（既に切断されていれば破棄）
    pub async fn to_connection(&self, connection_id: &ConnectionId, event: &ServerEvent) {
        let Some(json) = encode(event) else {
            return;
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &json).await {
            tracing::debug!("Dropped event for '{}': {}", connection_id, e);
        }
    }

    /// Deliver to a membership snapshot.
    pub async fn to_members(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        let Some(json) = encode(event) else {
            return;
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
            tracing::warn!("Failed to broadcast event: {}", e);
        }
    }

    pub async fn to_all(&self, event: &ServerEvent) {
        let Some(json) = encode(event) else {
            return;
        };
        if let Err(e) = self.message_pusher.broadcast_all(&json).await {
            tracing::warn!("Failed to broadcast event to all clients: {}", e);
        }
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_json() {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize {:?}: {}", event, e);
            None
        }
    }
}
