//! Event Dispatcher
//!
//! 受信したテキストフレームをデコードし、ユースケースを呼び出して結果を配信します。
//! 成功時は対象メンバーへ、拒否時は送信元だけへイベントを返します。
//!
//! 状態の変更から配信の完了までは `BroadcastRouter::sequence` のガードを保持するので、
//! どの接続から来たイベントでも、メンバーには変更が確定した順に届きます。
//! 回答の距離計算だけはガードの外で行います。

use serde_json::Value;

use crate::{
    domain::{
        ConnectionId, Coordinate, Departure, GameSettings, Joined, Nickname, RoomError, RoomId,
        RoomSnapshot, RoundStarted, ValueObjectError,
    },
    infrastructure::dto::{
        conversion::player_list_event,
        websocket::{
            AnswerPayload, ClientCommand, CreateRoomPayload, DecodeError, JoinRoomPayload,
            KickPlayerPayload, RoomPayload, RoundCoordinatesPayload, ServerEvent,
        },
    },
    usecase::{AnswerSubmitted, CreateRoomInput, MeasuredAnswer},
};

use super::state::AppState;

/// Handle one inbound text frame from `origin`.
pub async fn dispatch(state: &AppState, origin: &ConnectionId, text: &str) {
    let command = match ClientCommand::decode(text) {
        Ok(command) => command,
        Err(DecodeError::MalformedPayload { event, reason }) => {
            tracing::warn!("Malformed '{}' payload from '{}': {}", event, origin, reason);
            let rejection = ServerEvent::Error {
                event,
                reason: "malformed_payload".to_string(),
                message: reason,
            };
            state.broadcast.to_connection(origin, &rejection).await;
            return;
        }
        Err(e) => {
            tracing::warn!("Ignoring frame from '{}': {}", origin, e);
            return;
        }
    };

    let event = command.event_name();
    tracing::debug!("Dispatching '{}' from '{}'", event, origin);

    // submit_answer は距離の取得が終わってからガードを取る
    let _order = match command {
        ClientCommand::SubmitAnswer(_) => None,
        _ => Some(state.broadcast.sequence().await),
    };

    match command {
        ClientCommand::Create(payload) => handle_create(state, origin, payload).await,
        ClientCommand::Join(payload) => handle_join(state, origin, payload).await,
        ClientCommand::Leave(payload) => handle_leave(state, origin, payload).await,
        ClientCommand::KickPlayer(payload) => match kick(state, origin, payload).await {
            Ok(departure) => announce_kick(state, &departure).await,
            Err(e) => reject(state, origin, event, &e).await,
        },
        ClientCommand::ListRooms => {
            let rooms = state.list_rooms_usecase.execute().await;
            let reply = ServerEvent::AvailableRooms {
                rooms: rooms.iter().map(Into::into).collect(),
            };
            state.broadcast.to_connection(origin, &reply).await;
        }
        ClientCommand::StartGame(payload) => match start_game(state, origin, payload).await {
            Ok(room) => {
                let started = ServerEvent::GameStarted {
                    room: room.id.to_string(),
                    game_settings: room.settings.to_value(),
                };
                state.broadcast.to_members(room.member_ids(), &started).await;
            }
            Err(e) => reject(state, origin, event, &e).await,
        },
        ClientCommand::PreGenerateLocations(payload) => {
            match state
                .pre_generate_locations_usecase
                .execute(origin, payload.count)
                .await
            {
                Ok((room_id, count)) => {
                    let reply = ServerEvent::LocationsPreGenerated {
                        room: room_id.to_string(),
                        count,
                    };
                    state.broadcast.to_connection(origin, &reply).await;
                }
                Err(e) => reject(state, origin, event, &e).await,
            }
        }
        ClientCommand::StartRound(payload) | ClientCommand::ProvideCoordinates(payload) => {
            match start_round(state, origin, payload).await {
                Ok(started) => {
                    let new_round = ServerEvent::NewRound {
                        room: started.room.id.to_string(),
                        round: started.detail.round,
                        lat: started.detail.location.lat(),
                        lng: started.detail.location.lng(),
                    };
                    state
                        .broadcast
                        .to_members(started.room.member_ids(), &new_round)
                        .await;
                }
                Err(e) => reject(state, origin, event, &e).await,
            }
        }
        ClientCommand::SendMessage(message) => handle_send_message(state, origin, message).await,
        ClientCommand::SubmitAnswer(payload) => handle_submit_answer(state, origin, payload).await,
    }
}

/// Tell the remaining members that someone left. Nothing is sent for a deleted room.
pub async fn announce_departure(state: &AppState, departure: &Departure) {
    if departure.room_deleted() {
        return;
    }
    let targets = departure.remaining_ids();
    let announcement = ServerEvent::LeaveRoomAnnouncement {
        room: departure.room_id.to_string(),
        id: departure.member.connection_id.to_string(),
        nickname: departure.member.nickname.to_string(),
    };
    state
        .broadcast
        .to_members(targets.clone(), &announcement)
        .await;
    state
        .broadcast
        .to_members(
            targets,
            &player_list_event(&departure.room_id, &departure.remaining),
        )
        .await;
}

async fn reject(state: &AppState, origin: &ConnectionId, event: &str, error: &RoomError) {
    tracing::warn!("'{}' from '{}' rejected: {}", event, origin, error);
    let rejection = ServerEvent::Error {
        event: event.to_string(),
        reason: error.code().to_string(),
        message: error.to_string(),
    };
    state.broadcast.to_connection(origin, &rejection).await;
}

// ========================================
// create / join / leave
// ========================================

async fn handle_create(state: &AppState, origin: &ConnectionId, payload: CreateRoomPayload) {
    let requested = payload.room.clone();
    let result = match create_input(payload) {
        Ok(input) => state.create_room_usecase.execute(origin, input).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(room) => {
            let created = ServerEvent::RoomCreated {
                room: room.id.to_string(),
                game_settings: room.settings.to_value(),
            };
            state.broadcast.to_connection(origin, &created).await;
            state
                .broadcast
                .to_members(room.member_ids(), &player_list_event(&room.id, &room.members))
                .await;
        }
        Err(e) => {
            tracing::warn!("Room '{}' not created for '{}': {}", requested, origin, e);
            let rejection = ServerEvent::RoomCreationFailed {
                room: requested,
                reason: e.code().to_string(),
                message: e.to_string(),
            };
            state.broadcast.to_connection(origin, &rejection).await;
        }
    }
}

fn create_input(payload: CreateRoomPayload) -> Result<CreateRoomInput, ValueObjectError> {
    Ok(CreateRoomInput {
        room_id: RoomId::new(payload.room)?,
        nickname: payload.nickname.map(Nickname::new).transpose()?,
        settings: GameSettings::try_from(payload.game_settings)?,
    })
}

async fn handle_join(state: &AppState, origin: &ConnectionId, payload: JoinRoomPayload) {
    let requested = payload.room.clone();
    match join(state, origin, payload).await {
        Ok(joined) => {
            let targets = joined.room.member_ids();
            let announcement = ServerEvent::JoinRoomAnnouncement {
                room: joined.room.id.to_string(),
                id: joined.member.connection_id.to_string(),
                nickname: joined.member.nickname.to_string(),
            };
            state
                .broadcast
                .to_members(targets.clone(), &announcement)
                .await;
            state
                .broadcast
                .to_members(
                    targets,
                    &player_list_event(&joined.room.id, &joined.room.members),
                )
                .await;
        }
        Err(RoomError::RoomFull(room)) => {
            tracing::info!("'{}' could not join full room '{}'", origin, room);
            state
                .broadcast
                .to_connection(origin, &ServerEvent::RoomFull { room })
                .await;
        }
        Err(e) => {
            tracing::warn!("'{}' could not join '{}': {}", origin, requested, e);
            let rejection = ServerEvent::JoinError {
                room: requested,
                reason: e.code().to_string(),
                message: e.to_string(),
            };
            state.broadcast.to_connection(origin, &rejection).await;
        }
    }
}

async fn join(
    state: &AppState,
    origin: &ConnectionId,
    payload: JoinRoomPayload,
) -> Result<Joined, RoomError> {
    let room_id = RoomId::new(payload.room)?;
    let nickname = payload.nickname.map(Nickname::new).transpose()?;
    state
        .join_room_usecase
        .execute(origin, &room_id, nickname)
        .await
}

async fn handle_leave(state: &AppState, origin: &ConnectionId, payload: RoomPayload) {
    let Ok(room_id) = RoomId::new(payload.room) else {
        tracing::debug!("Ignoring leave with an invalid room id from '{}'", origin);
        return;
    };
    if let Some(departure) = state.leave_room_usecase.execute(origin, &room_id).await {
        announce_departure(state, &departure).await;
    }
}

// ========================================
// admin operations
// ========================================

async fn kick(
    state: &AppState,
    origin: &ConnectionId,
    payload: KickPlayerPayload,
) -> Result<Departure, RoomError> {
    let room_id = RoomId::new(payload.room)?;
    // 不正な ID のプレイヤーは Room に存在し得ない
    let target = ConnectionId::try_from(payload.target_id.as_str())
        .map_err(|_| RoomError::TargetNotFound(payload.target_id.clone()))?;
    state
        .kick_player_usecase
        .execute(&room_id, origin, &target)
        .await
}

async fn announce_kick(state: &AppState, departure: &Departure) {
    let kicked = departure.member.connection_id;
    let notice = ServerEvent::PlayerKicked {
        room: departure.room_id.to_string(),
        id: kicked.to_string(),
        nickname: departure.member.nickname.to_string(),
    };

    let mut targets = departure.remaining_ids();
    targets.push(kicked);
    state.broadcast.to_members(targets, &notice).await;

    if !departure.room_deleted() {
        state
            .broadcast
            .to_members(
                departure.remaining_ids(),
                &player_list_event(&departure.room_id, &departure.remaining),
            )
            .await;
    }
}

async fn start_game(
    state: &AppState,
    origin: &ConnectionId,
    payload: RoomPayload,
) -> Result<RoomSnapshot, RoomError> {
    let room_id = RoomId::new(payload.room)?;
    state.start_game_usecase.execute(&room_id, origin).await
}

// ========================================
// rounds / chat
// ========================================

async fn start_round(
    state: &AppState,
    origin: &ConnectionId,
    payload: RoundCoordinatesPayload,
) -> Result<RoundStarted, RoomError> {
    let provided = match (payload.lat, payload.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)?),
        _ => None,
    };
    state.start_round_usecase.execute(origin, provided).await
}

async fn handle_submit_answer(state: &AppState, origin: &ConnectionId, payload: AnswerPayload) {
    let measured = match measure_answer(state, origin, payload).await {
        Ok(measured) => measured,
        Err(e) => return reject(state, origin, "submit_answer", &e).await,
    };

    let _order = state.broadcast.sequence().await;
    match state.submit_answer_usecase.record(measured).await {
        Ok(submitted) => announce_answer(state, submitted).await,
        Err(e) => reject(state, origin, "submit_answer", &e).await,
    }
}

async fn measure_answer(
    state: &AppState,
    origin: &ConnectionId,
    payload: AnswerPayload,
) -> Result<MeasuredAnswer, RoomError> {
    let location = Coordinate::new(payload.lat, payload.lng)?;
    state.submit_answer_usecase.measure(origin, location).await
}

async fn announce_answer(state: &AppState, submitted: AnswerSubmitted) {
    let AnswerSubmitted {
        room,
        round,
        answer,
    } = submitted;
    let event = ServerEvent::AnswerSubmitted {
        room: room.id.to_string(),
        round,
        id: answer.connection_id.to_string(),
        nickname: answer.nickname.into_string(),
        lat: answer.location.lat(),
        lng: answer.location.lng(),
        distance_m: answer.distance_m,
    };
    state.broadcast.to_members(room.member_ids(), &event).await;
}

async fn handle_send_message(state: &AppState, origin: &ConnectionId, message: Value) {
    match state.send_message_usecase.execute(origin).await {
        Ok(sender) => {
            let event = ServerEvent::ReceiveMessage {
                id: sender.id.to_string(),
                nickname: sender.nickname.into_string(),
                message,
            };
            state.broadcast.to_all(&event).await;
        }
        Err(e) => reject(state, origin, "send_message", &e).await,
    }
}
