//! エンティティ
//!
//! ## Room の不変条件
//!
//! - メンバーが 0 人の Room は存在しない（空になった時点で Lobby から削除される）
//! - admin は作成者 1 人だけで、自動的に移譲されることはない
//! - ラウンド番号は開始済みラウンド数と常に一致し、減ることはない

use std::collections::VecDeque;

use super::{
    error::RoomError,
    value_object::{ConnectionId, Coordinate, GameSettings, Nickname, RoomId, Timestamp},
};

/// A live connection as seen by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub nickname: Nickname,
    /// Weak back-reference to the room this connection belongs to.
    pub room: Option<RoomId>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, nickname: Nickname, connected_at: Timestamp) -> Self {
        Self {
            id,
            nickname,
            room: None,
            connected_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub connection_id: ConnectionId,
    /// Copied from the connection at join time.
    pub nickname: Nickname,
    pub is_admin: bool,
}

/// An answer submitted for a round.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub connection_id: ConnectionId,
    pub nickname: Nickname,
    pub location: Coordinate,
    /// `None` when the distance lookup was unavailable.
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundDetail {
    pub round: u32,
    pub location: Coordinate,
    pub started_at: Timestamp,
    pub answers: Vec<Answer>,
}

/// Where the challenge location of a new round comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundLocation {
    /// Supplied by the client; used as is.
    Provided(Coordinate),
    /// Used only when the pending pool is empty.
    Fallback(Coordinate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    pub settings: GameSettings,
    pub started: bool,
    pub capacity: usize,
    /// Insertion ordered.
    members: Vec<Member>,
    round: u32,
    rounds: Vec<RoundDetail>,
    pending_locations: VecDeque<Coordinate>,
}

impl Room {
    /// Create a room whose only member is its admin.
    pub fn new(
        id: RoomId,
        creator: ConnectionId,
        creator_nickname: Nickname,
        settings: GameSettings,
        created_at: Timestamp,
        capacity: usize,
    ) -> Self {
        Self {
            id,
            created_at,
            settings,
            started: false,
            capacity,
            members: vec![Member {
                connection_id: creator,
                nickname: creator_nickname,
                is_admin: true,
            }],
            round: 0,
            rounds: Vec::new(),
            pending_locations: VecDeque::new(),
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, connection_id: &ConnectionId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| &m.connection_id == connection_id)
    }

    pub fn is_admin(&self, connection_id: &ConnectionId) -> bool {
        self.member(connection_id).is_some_and(|m| m.is_admin)
    }

    /// Add a non-admin member.
    pub fn add_member(
        &mut self,
        connection_id: ConnectionId,
        nickname: Nickname,
    ) -> Result<Member, RoomError> {
        if self.member(&connection_id).is_some() {
            return Err(RoomError::AlreadyInRoom(self.id.to_string()));
        }
        if self.members.len() >= self.capacity {
            return Err(RoomError::RoomFull(self.id.to_string()));
        }
        let member = Member {
            connection_id,
            nickname,
            is_admin: false,
        };
        self.members.push(member.clone());
        Ok(member)
    }

    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> Option<Member> {
        let index = self
            .members
            .iter()
            .position(|m| &m.connection_id == connection_id)?;
        Some(self.members.remove(index))
    }

    /// Mark the game as started. Repeating this as admin is allowed.
    pub fn start_game(&mut self, requester: &ConnectionId) -> Result<(), RoomError> {
        if !self.is_admin(requester) {
            return Err(RoomError::Forbidden);
        }
        self.started = true;
        Ok(())
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn rounds(&self) -> &[RoundDetail] {
        &self.rounds
    }

    pub fn current_round(&self) -> Option<&RoundDetail> {
        self.rounds.last()
    }

    pub fn pending_locations(&self) -> impl Iterator<Item = &Coordinate> {
        self.pending_locations.iter()
    }

    /// Advance to the next round and log its detail record.
    pub fn begin_round(&mut self, location: RoundLocation, now: Timestamp) -> &RoundDetail {
        let location = match location {
            RoundLocation::Provided(c) => c,
            RoundLocation::Fallback(c) => self.pending_locations.pop_front().unwrap_or(c),
        };
        self.round += 1;
        self.rounds.push(RoundDetail {
            round: self.round,
            location,
            started_at: now,
            answers: Vec::new(),
        });
        &self.rounds[self.rounds.len() - 1]
    }

    /// Replace (not extend) the pending location pool.
    pub fn replace_pending_locations(&mut self, locations: Vec<Coordinate>) {
        self.pending_locations = locations.into();
    }

    /// Attach an answer to the given round.
    pub fn record_answer(&mut self, round: u32, answer: Answer) -> Result<(), RoomError> {
        let detail = self
            .rounds
            .iter_mut()
            .find(|r| r.round == round)
            .ok_or_else(|| RoomError::NoRoundInProgress(self.id.to_string()))?;
        detail.answers.push(answer);
        Ok(())
    }

    /// Expired once the age reaches `ttl_millis`, regardless of membership.
    pub fn is_expired(&self, now: Timestamp, ttl_millis: i64) -> bool {
        self.created_at.elapsed_until(now) >= ttl_millis
    }
}
