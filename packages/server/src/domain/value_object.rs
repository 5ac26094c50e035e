//! 値オブジェクト
//!
//! 生成時に検証を行い、不正な値を持つインスタンスが存在しないことを保証します。

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Identifier of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<&str> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidConnectionId(value.to_string()))
    }
}

/// Display name of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nickname(String);

impl Nickname {
    pub const MAX_LEN: usize = 32;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyNickname);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValueObjectError::NicknameTooLong { max: Self::MAX_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Nickname {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates cosmetic nicknames: a vocabulary word followed by four digits.
///
/// Collisions are not checked.
pub struct NicknameFactory;

impl NicknameFactory {
    const WORDS: &'static [&'static str] = &[
        "Otter", "Falcon", "Lynx", "Heron", "Badger", "Marten", "Beaver", "Raven", "Ibex",
        "Kestrel", "Stoat", "Wren", "Osprey", "Chamois", "Hare", "Magpie",
    ];

    pub fn generate() -> Nickname {
        let mut rng = rand::rng();
        let word = Self::WORDS[rng.random_range(0..Self::WORDS.len())];
        let suffix: u16 = rng.random_range(1000..=9999);
        Nickname(format!("{word}{suffix}"))
    }
}

/// Room identifier chosen by the creating client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub const MAX_LEN: usize = 64;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyRoomId);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValueObjectError::RoomIdTooLong { max: Self::MAX_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `self` to `now`, never negative.
    pub fn elapsed_until(&self, now: Timestamp) -> i64 {
        (now.0 - self.0).max(0)
    }
}

/// A point on the globe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValueObjectError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValueObjectError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValueObjectError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// Opaque key/value configuration supplied by a room's creator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameSettings(serde_json::Map<String, serde_json::Value>);

impl GameSettings {
    pub fn as_map(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }
}

impl TryFrom<Option<serde_json::Value>> for GameSettings {
    type Error = ValueObjectError;

    /// `None` and JSON `null` both mean "no settings".
    fn try_from(value: Option<serde_json::Value>) -> Result<Self, Self::Error> {
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(serde_json::Value::Object(map)) => Ok(Self(map)),
            Some(_) => Err(ValueObjectError::InvalidGameSettings),
        }
    }
}
