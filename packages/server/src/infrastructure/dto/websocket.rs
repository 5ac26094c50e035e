//! WebSocket message DTOs.
//!
//! Every frame is a JSON text message of the form `{"event": <name>, "data": <payload>}`.
//! Event names are the wire contract and must not change.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

// ========================================
// Inbound
// ========================================

/// Raw inbound frame before the payload is interpreted.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateRoomPayload {
    pub room: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub game_settings: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinRoomPayload {
    pub room: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoomPayload {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KickPlayerPayload {
    pub room: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreGeneratePayload {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RoundCoordinatesPayload {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswerPayload {
    pub lat: f64,
    pub lng: f64,
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Create(CreateRoomPayload),
    Join(JoinRoomPayload),
    Leave(RoomPayload),
    KickPlayer(KickPlayerPayload),
    ListRooms,
    StartGame(RoomPayload),
    PreGenerateLocations(PreGeneratePayload),
    StartRound(RoundCoordinatesPayload),
    /// Same handling as `StartRound`; kept apart so replies name the event that was sent.
    ProvideCoordinates(RoundCoordinatesPayload),
    SendMessage(Value),
    SubmitAnswer(AnswerPayload),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("frame is not a valid event envelope: {0}")]
    InvalidEnvelope(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("malformed '{event}' payload: {reason}")]
    MalformedPayload { event: String, reason: String },
}

impl ClientCommand {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| DecodeError::InvalidEnvelope(e.to_string()))?;
        let Envelope { event, data } = envelope;

        let command = match event.as_str() {
            "create" => Self::Create(payload(&event, data)?),
            "join" => Self::Join(payload(&event, data)?),
            "leave" => Self::Leave(payload(&event, data)?),
            "kick_player" => Self::KickPlayer(payload(&event, data)?),
            "list_rooms" => Self::ListRooms,
            "start_game" => Self::StartGame(payload(&event, data)?),
            "pre_generate_locations" => Self::PreGenerateLocations(payload(&event, data)?),
            "start_round" | "provide_coordinates" => {
                let coordinates: RoundCoordinatesPayload = optional_payload(&event, data)?;
                if coordinates.lat.is_some() != coordinates.lng.is_some() {
                    return Err(DecodeError::MalformedPayload {
                        event,
                        reason: "lat and lng must be given together".to_string(),
                    });
                }
                if event == "start_round" {
                    Self::StartRound(coordinates)
                } else {
                    Self::ProvideCoordinates(coordinates)
                }
            }
            "send_message" => Self::SendMessage(data),
            "submit_answer" => Self::SubmitAnswer(payload(&event, data)?),
            _ => return Err(DecodeError::UnknownEvent(event)),
        };
        Ok(command)
    }

    /// Wire name of the event, used in rejections and logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Join(_) => "join",
            Self::Leave(_) => "leave",
            Self::KickPlayer(_) => "kick_player",
            Self::ListRooms => "list_rooms",
            Self::StartGame(_) => "start_game",
            Self::PreGenerateLocations(_) => "pre_generate_locations",
            Self::StartRound(_) => "start_round",
            Self::ProvideCoordinates(_) => "provide_coordinates",
            Self::SendMessage(_) => "send_message",
            Self::SubmitAnswer(_) => "submit_answer",
        }
    }
}

fn payload<T: DeserializeOwned>(event: &str, data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|e| DecodeError::MalformedPayload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

/// Like [`payload`], but a missing `data` means "all fields absent".
fn optional_payload<T: DeserializeOwned + Default>(
    event: &str,
    data: Value,
) -> Result<T, DecodeError> {
    if data.is_null() {
        return Ok(T::default());
    }
    payload(event, data)
}

// ========================================
// Outbound
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub nickname: String,
    pub admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummaryDto {
    pub nickname: String,
    pub admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomListingDto {
    pub room: String,
    pub player_count: usize,
    pub players: Vec<PlayerSummaryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    AssignedNickname {
        id: String,
        nickname: String,
    },
    RoomCreated {
        room: String,
        game_settings: Value,
    },
    RoomCreationFailed {
        room: String,
        reason: String,
        message: String,
    },
    JoinRoomAnnouncement {
        room: String,
        id: String,
        nickname: String,
    },
    JoinError {
        room: String,
        reason: String,
        message: String,
    },
    RoomFull {
        room: String,
    },
    LeaveRoomAnnouncement {
        room: String,
        id: String,
        nickname: String,
    },
    PlayerKicked {
        room: String,
        id: String,
        nickname: String,
    },
    UpdatePlayerList {
        room: String,
        players: Vec<PlayerDto>,
    },
    AvailableRooms {
        rooms: Vec<RoomListingDto>,
    },
    GameStarted {
        room: String,
        game_settings: Value,
    },
    NewRound {
        room: String,
        round: u32,
        lat: f64,
        lng: f64,
    },
    LocationsPreGenerated {
        room: String,
        count: usize,
    },
    ReceiveMessage {
        id: String,
        nickname: String,
        message: Value,
    },
    AnswerSubmitted {
        room: String,
        round: u32,
        id: String,
        nickname: String,
        lat: f64,
        lng: f64,
        distance_m: Option<f64>,
    },
    Error {
        event: String,
        reason: String,
        message: String,
    },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_create_with_optional_fields() {
        // テスト項目: create の任意フィールドが省略されていてもデコードできる
        // given (前提条件):
        let text = r#"{"event":"create","data":{"room":"A1"}}"#;

        // when (操作):
        let command = ClientCommand::decode(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            ClientCommand::Create(CreateRoomPayload {
                room: "A1".to_string(),
                nickname: None,
                game_settings: None,
            })
        );
    }

    #[test]
    fn test_decode_missing_required_key_is_malformed() {
        // テスト項目: 必須キーが欠けている場合は MalformedPayload になる
        // given (前提条件):
        let text = r#"{"event":"kick_player","data":{"room":"A1"}}"#;

        // when (操作):
        let result = ClientCommand::decode(text);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(DecodeError::MalformedPayload { ref event, .. }) if event == "kick_player"
        ));
    }

    #[test]
    fn test_decode_unknown_event_and_garbage() {
        // テスト項目: 未知のイベントと JSON でないフレームはそれぞれ区別される
        // given (前提条件):
        let unknown = r#"{"event":"dance","data":{}}"#;
        let garbage = "hello";

        // when (操作):
        let unknown_result = ClientCommand::decode(unknown);
        let garbage_result = ClientCommand::decode(garbage);

        // then (期待する結果):
        assert_eq!(
            unknown_result,
            Err(DecodeError::UnknownEvent("dance".to_string()))
        );
        assert!(matches!(garbage_result, Err(DecodeError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_decode_round_events() {
        // テスト項目: start_round はデータ無し、provide_coordinates は座標付きでデコードできる
        // given (前提条件):
        let start = r#"{"event":"start_round"}"#;
        let provide = r#"{"event":"provide_coordinates","data":{"lat":1.5,"lng":2.5}}"#;
        let half = r#"{"event":"provide_coordinates","data":{"lat":1.5}}"#;

        // when (操作):
        let start = ClientCommand::decode(start).unwrap();
        let provide = ClientCommand::decode(provide).unwrap();
        let half = ClientCommand::decode(half);

        // then (期待する結果):
        assert_eq!(
            start,
            ClientCommand::StartRound(RoundCoordinatesPayload::default())
        );
        assert_eq!(
            provide,
            ClientCommand::ProvideCoordinates(RoundCoordinatesPayload {
                lat: Some(1.5),
                lng: Some(2.5),
            })
        );
        assert!(matches!(half, Err(DecodeError::MalformedPayload { .. })));
        assert_eq!(start.event_name(), "start_round");
        assert_eq!(provide.event_name(), "provide_coordinates");
    }

    #[test]
    fn test_send_message_accepts_arbitrary_payload() {
        // テスト項目: send_message は任意の JSON をそのまま受け付ける
        // given (前提条件):
        let text = r#"{"event":"send_message","data":["gg", 1, {"x": null}]}"#;

        // when (操作):
        let command = ClientCommand::decode(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            ClientCommand::SendMessage(json!(["gg", 1, {"x": null}]))
        );
    }

    #[test]
    fn test_server_event_wire_format() {
        // テスト項目: ServerEvent が {"event", "data"} 形式で snake_case にシリアライズされる
        // given (前提条件):
        let event = ServerEvent::NewRound {
            room: "A1".to_string(),
            round: 3,
            lat: 1.0,
            lng: -2.0,
        };

        // when (操作):
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"event": "new_round", "data": {"room": "A1", "round": 3, "lat": 1.0, "lng": -2.0}})
        );
    }
}
