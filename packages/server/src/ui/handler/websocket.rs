//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{Stream, StreamExt},
};
use tokio::sync::{mpsc, watch};

use crate::{
    domain::ConnectionId,
    infrastructure::dto::websocket::ServerEvent,
    ui::{
        dispatcher::{announce_departure, dispatch},
        state::AppState,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Events for this connection (from any dispatcher call) arrive through `rx`
/// in the order they were queued.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Handles inbound frames one at a time until the client goes away or `stop` fires.
///
/// `stop` is only observed between frames, so a dispatch that has started always
/// finishes its state change and its deliveries.
async fn receive_loop<S>(
    mut receiver: S,
    mut stop: watch::Receiver<bool>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = stop.changed() => break,
        };
        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                tracing::trace!("Received from '{}': {}", connection_id, text.as_str());
                dispatch(&state, &connection_id, text.as_str()).await;
            }
            Message::Binary(_) => {
                tracing::warn!("Ignoring binary frame from '{}'", connection_id);
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", connection_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection = state.connect_client_usecase.execute(tx).await;
    let connection_id = connection.id;

    state
        .broadcast
        .to_connection(
            &connection_id,
            &ServerEvent::AssignedNickname {
                id: connection_id.to_string(),
                nickname: connection.nickname.to_string(),
            },
        )
        .await;

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        stop_rx,
        state.clone(),
        connection_id,
    ));
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, stop the other
    let recv_finished = tokio::select! {
        _ = &mut recv_task => {
            send_task.abort();
            true
        }
        _ = &mut send_task => false,
    };
    if !recv_finished {
        // let an in-flight dispatch complete before cleaning up
        let _ = stop_tx.send(true);
        let _ = recv_task.await;
    }

    let _order = state.broadcast.sequence().await;
    match state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await
    {
        Some(departure) => announce_departure(&state, &departure).await,
        None => tracing::debug!("'{}' disconnected outside any room", connection_id),
    }
    tracing::info!("Client '{}' disconnected", connection_id);
}
