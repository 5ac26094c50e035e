//! ドメイン層のエラー型

use thiserror::Error;

/// Validation errors raised while constructing value objects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    EmptyRoomId,

    #[error("room id must be at most {max} characters")]
    RoomIdTooLong { max: usize },

    #[error("nickname must not be empty")]
    EmptyNickname,

    #[error("nickname must be at most {max} characters")]
    NicknameTooLong { max: usize },

    #[error("invalid connection id '{0}'")]
    InvalidConnectionId(String),

    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("game settings must be a JSON object")]
    InvalidGameSettings,
}

/// Rejections produced by room and round operations.
///
/// Every variant is recoverable: the dispatcher turns it into a rejection
/// event for the originating connection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomError {
    #[error("room '{0}' already exists")]
    AlreadyExists(String),

    #[error("room '{0}' not found")]
    NotFound(String),

    #[error("room '{0}' is full")]
    RoomFull(String),

    #[error("already in room '{0}'")]
    AlreadyInRoom(String),

    #[error("only the room admin can do this")]
    Forbidden,

    #[error("player '{0}' is not in the room")]
    TargetNotFound(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("no round in progress in room '{0}'")]
    NoRoundInProgress(String),

    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),
}

impl RoomError {
    /// Stable machine-readable reason sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::AlreadyExists(_) => "already_exists",
            RoomError::NotFound(_) => "not_found",
            RoomError::RoomFull(_) => "room_full",
            RoomError::AlreadyInRoom(_) => "already_in_room",
            RoomError::Forbidden => "forbidden",
            RoomError::TargetNotFound(_) => "target_not_found",
            RoomError::MalformedPayload(_) => "malformed_payload",
            RoomError::NoRoundInProgress(_) => "no_round_in_progress",
            RoomError::ConnectionNotFound(_) => "connection_not_found",
        }
    }
}

impl From<ValueObjectError> for RoomError {
    fn from(e: ValueObjectError) -> Self {
        RoomError::MalformedPayload(e.to_string())
    }
}

/// Storage-level failures, independent of room rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("timed out after {0:?} waiting for the room store lock")]
    LockTimeout(std::time::Duration),
}

/// Errors raised while pushing messages to connections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Failure of the external distance lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistanceError {
    #[error("distance unavailable: {0}")]
    Unavailable(String),
}
