//! ドメイン層
//!
//! Room・接続・ラウンドのモデルと、それらを扱うための trait を定義します。

pub mod entity;
pub mod error;
pub mod lobby;
pub mod location;
pub mod message_pusher;
pub mod policy;
pub mod repository;
pub mod value_object;

pub use entity::{Answer, Connection, Member, Room, RoundDetail, RoundLocation};
pub use error::{DistanceError, MessagePushError, RepositoryError, RoomError, ValueObjectError};
pub use lobby::{AnswerTarget, Departure, Joined, Lobby, RoomSnapshot, RoundStarted};
pub use location::{DistanceLookup, LocationGenerator};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use policy::RoomPolicy;
pub use repository::RoomRepository;
pub use value_object::{
    ConnectionId, Coordinate, GameSettings, Nickname, NicknameFactory, RoomId, Timestamp,
};
