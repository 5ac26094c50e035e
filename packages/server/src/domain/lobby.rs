//! Lobby 集約
//!
//! 接続レジストリと Room ストアを 1 つの集約にまとめ、両者の整合性
//! （Connection.room と Room のメンバーシップが常に一致すること）を保証します。
//! 排他制御はリポジトリ実装の責務で、ここでは同期的な状態遷移のみを扱います。

use std::collections::HashMap;

use super::{
    entity::{Answer, Connection, Member, Room, RoundDetail, RoundLocation},
    error::RoomError,
    value_object::{ConnectionId, Coordinate, GameSettings, Nickname, RoomId, Timestamp},
};

/// Point-in-time copy of a room, safe to hand out after the lock is released.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub created_at: Timestamp,
    pub settings: GameSettings,
    pub started: bool,
    pub round: u32,
    pub members: Vec<Member>,
}

impl RoomSnapshot {
    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.connection_id).collect()
    }
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            created_at: room.created_at,
            settings: room.settings.clone(),
            started: room.started,
            round: room.round(),
            members: room.members().to_vec(),
        }
    }
}

/// A member leaving a room, for whatever reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub room_id: RoomId,
    pub member: Member,
    /// Members left after the removal. Empty means the room was deleted.
    pub remaining: Vec<Member>,
}

impl Departure {
    pub fn room_deleted(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn remaining_ids(&self) -> Vec<ConnectionId> {
        self.remaining.iter().map(|m| m.connection_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joined {
    pub member: Member,
    pub room: RoomSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundStarted {
    pub detail: RoundDetail,
    pub room: RoomSnapshot,
}

/// The round an answer will be attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerTarget {
    pub room_id: RoomId,
    pub round: u32,
    pub location: Coordinate,
    pub nickname: Nickname,
}

#[derive(Debug, Default)]
pub struct Lobby {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomId, Room>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================
    // Connection Registry
    // ========================================

    pub fn register(&mut self, connection: Connection) {
        self.connections.insert(connection.id, connection);
    }

    /// Remove the connection and detach it from its room.
    ///
    /// Returns `None` if the connection was already gone, so cleanup runs at
    /// most once per connection.
    pub fn unregister(
        &mut self,
        connection_id: &ConnectionId,
    ) -> Option<(Connection, Option<Departure>)> {
        let departure = self.leave_room(connection_id);
        let connection = self.connections.remove(connection_id)?;
        Some((connection, departure))
    }

    pub fn connection(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    fn connection_mut(&mut self, connection_id: &ConnectionId) -> Result<&mut Connection, RoomError> {
        self.connections
            .get_mut(connection_id)
            .ok_or_else(|| RoomError::ConnectionNotFound(connection_id.to_string()))
    }

    fn current_room_id(&self, connection_id: &ConnectionId) -> Result<RoomId, RoomError> {
        let connection = self
            .connections
            .get(connection_id)
            .ok_or_else(|| RoomError::ConnectionNotFound(connection_id.to_string()))?;
        connection
            .room
            .clone()
            .ok_or_else(|| RoomError::NotFound("<none>".to_string()))
    }

    fn room_mut(&mut self, room_id: &RoomId) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))
    }

    // ========================================
    // Room Store
    // ========================================

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Create a room with `creator` as its admin.
    ///
    /// A requested nickname replaces the creator's only when the room is created.
    pub fn create_room(
        &mut self,
        room_id: RoomId,
        creator: &ConnectionId,
        nickname: Option<Nickname>,
        settings: GameSettings,
        created_at: Timestamp,
        capacity: usize,
    ) -> Result<RoomSnapshot, RoomError> {
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::AlreadyExists(room_id.to_string()));
        }
        let connection = self.connection_mut(creator)?;
        if let Some(current) = &connection.room {
            return Err(RoomError::AlreadyInRoom(current.to_string()));
        }
        if let Some(nickname) = nickname {
            connection.nickname = nickname;
        }
        connection.room = Some(room_id.clone());
        let room = Room::new(
            room_id.clone(),
            *creator,
            connection.nickname.clone(),
            settings,
            created_at,
            capacity,
        );
        let snapshot = RoomSnapshot::from(&room);
        self.rooms.insert(room_id, room);
        Ok(snapshot)
    }

    /// Add the connection to a room. Like [`Lobby::create_room`], a requested
    /// nickname is kept only if the join succeeds.
    pub fn join_room(
        &mut self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        nickname: Option<Nickname>,
    ) -> Result<Joined, RoomError> {
        let connection = self
            .connections
            .get(connection_id)
            .ok_or_else(|| RoomError::ConnectionNotFound(connection_id.to_string()))?;
        let nickname = nickname.unwrap_or_else(|| connection.nickname.clone());
        let already_in = connection.room.clone();

        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        if let Some(current) = already_in {
            return Err(RoomError::AlreadyInRoom(current.to_string()));
        }
        let member = room.add_member(*connection_id, nickname.clone())?;
        let snapshot = RoomSnapshot::from(&*room);

        let connection = self.connection_mut(connection_id)?;
        connection.nickname = nickname;
        connection.room = Some(room_id.clone());
        Ok(Joined {
            member,
            room: snapshot,
        })
    }

    /// Remove the connection from its room; deletes the room once empty.
    pub fn leave_room(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let room_id = self.connections.get_mut(connection_id)?.room.take()?;
        self.remove_member(&room_id, connection_id)
    }

    fn remove_member(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Departure> {
        let room = self.rooms.get_mut(room_id)?;
        let member = room.remove_member(connection_id)?;
        let remaining = room.members().to_vec();
        if room.is_empty() {
            self.rooms.remove(room_id);
        }
        Some(Departure {
            room_id: room_id.clone(),
            member,
            remaining,
        })
    }

    pub fn kick(
        &mut self,
        room_id: &RoomId,
        requester: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<Departure, RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or(RoomError::Forbidden)?;
        // 自分自身のキックは admin 不在の Room を生むため拒否する
        if !room.is_admin(requester) || requester == target {
            return Err(RoomError::Forbidden);
        }
        if room.member(target).is_none() {
            return Err(RoomError::TargetNotFound(target.to_string()));
        }
        if let Some(connection) = self.connections.get_mut(target) {
            connection.room = None;
        }
        self.remove_member(room_id, target)
            .ok_or_else(|| RoomError::TargetNotFound(target.to_string()))
    }

    pub fn start_game(
        &mut self,
        room_id: &RoomId,
        requester: &ConnectionId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.room_mut(room_id)?;
        room.start_game(requester)?;
        Ok(RoomSnapshot::from(&*room))
    }

    // ========================================
    // Round Coordinator
    // ========================================

    /// Start the next round in the caller's room.
    pub fn begin_round(
        &mut self,
        connection_id: &ConnectionId,
        location: RoundLocation,
        now: Timestamp,
    ) -> Result<RoundStarted, RoomError> {
        let room_id = self.current_room_id(connection_id)?;
        let room = self.room_mut(&room_id)?;
        let detail = room.begin_round(location, now).clone();
        Ok(RoundStarted {
            detail,
            room: RoomSnapshot::from(&*room),
        })
    }

    pub fn replace_pending_locations(
        &mut self,
        connection_id: &ConnectionId,
        locations: Vec<Coordinate>,
    ) -> Result<RoomId, RoomError> {
        let room_id = self.current_room_id(connection_id)?;
        self.room_mut(&room_id)?
            .replace_pending_locations(locations);
        Ok(room_id)
    }

    pub fn answer_target(&self, connection_id: &ConnectionId) -> Result<AnswerTarget, RoomError> {
        let room_id = self.current_room_id(connection_id)?;
        let room = self
            .rooms
            .get(&room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        let current = room
            .current_round()
            .ok_or_else(|| RoomError::NoRoundInProgress(room_id.to_string()))?;
        let nickname = room
            .member(connection_id)
            .map(|m| m.nickname.clone())
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        Ok(AnswerTarget {
            room_id,
            round: current.round,
            location: current.location,
            nickname,
        })
    }

    /// Record an answer in the room the connection is still in.
    pub fn record_answer(
        &mut self,
        room_id: &RoomId,
        round: u32,
        answer: Answer,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.room_mut(room_id)?;
        if room.member(&answer.connection_id).is_none() {
            return Err(RoomError::NotFound(room_id.to_string()));
        }
        room.record_answer(round, answer)?;
        Ok(RoomSnapshot::from(&*room))
    }

    // ========================================
    // Expiry
    // ========================================

    /// Delete every room whose age has reached `ttl_millis`, members or not.
    pub fn remove_expired(&mut self, now: Timestamp, ttl_millis: i64) -> Vec<RoomId> {
        let expired: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.is_expired(now, ttl_millis))
            .map(|room| room.id.clone())
            .collect();

        for room_id in &expired {
            if let Some(room) = self.rooms.remove(room_id) {
                for member in room.members() {
                    if let Some(connection) = self.connections.get_mut(&member.connection_id) {
                        connection.room = None;
                    }
                }
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: usize = 10;

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn connect(lobby: &mut Lobby, nickname: &str) -> ConnectionId {
        let id = ConnectionId::generate();
        lobby.register(Connection::new(
            id,
            Nickname::new(nickname.to_string()).unwrap(),
            Timestamp::new(0),
        ));
        id
    }

    fn create(lobby: &mut Lobby, id: &str, creator: &ConnectionId) -> Result<RoomSnapshot, RoomError> {
        lobby.create_room(
            room_id(id),
            creator,
            None,
            GameSettings::default(),
            Timestamp::new(0),
            CAPACITY,
        )
    }

    #[test]
    fn test_create_registers_back_reference() {
        // テスト項目: Room 作成時に作成者の Connection に所属 Room が記録される
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");

        // when (操作):
        let snapshot = create(&mut lobby, "A1", &c1).unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.members.len(), 1);
        assert!(snapshot.members[0].is_admin);
        assert_eq!(lobby.connection(&c1).unwrap().room, Some(room_id("A1")));
    }

    #[test]
    fn test_create_existing_room_is_rejected_without_mutation() {
        // テスト項目: 既存の Room ID での作成は拒否され、元の Room は変更されない
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        let c2 = connect(&mut lobby, "bob");
        create(&mut lobby, "B2", &c1).unwrap();
        let before = RoomSnapshot::from(lobby.room(&room_id("B2")).unwrap());

        // when (操作):
        let result = create(&mut lobby, "B2", &c2);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::AlreadyExists("B2".to_string())));
        let after = RoomSnapshot::from(lobby.room(&room_id("B2")).unwrap());
        assert_eq!(before, after);
        assert!(lobby.room(&room_id("B2")).unwrap().is_admin(&c1));
        assert_eq!(lobby.connection(&c2).unwrap().room, None);
    }

    #[test]
    fn test_join_errors() {
        // テスト項目: 存在しない Room・所属済み・定員超過の参加はそれぞれエラーになる
        // given (前提条件):
        let mut lobby = Lobby::new();
        let admin = connect(&mut lobby, "alice");
        create(&mut lobby, "A1", &admin).unwrap();
        let others: Vec<ConnectionId> = (0..CAPACITY)
            .map(|i| connect(&mut lobby, &format!("p{i}")))
            .collect();

        // when (操作):
        let missing = lobby.join_room(&room_id("nope"), &others[0], None);
        let already = lobby.join_room(&room_id("A1"), &admin, None);
        for id in &others[..CAPACITY - 1] {
            lobby.join_room(&room_id("A1"), id, None).unwrap();
        }
        let full = lobby.join_room(&room_id("A1"), &others[CAPACITY - 1], None);

        // then (期待する結果):
        assert_eq!(missing, Err(RoomError::NotFound("nope".to_string())));
        assert_eq!(already, Err(RoomError::AlreadyInRoom("A1".to_string())));
        assert_eq!(full, Err(RoomError::RoomFull("A1".to_string())));
        assert_eq!(lobby.room(&room_id("A1")).unwrap().member_count(), CAPACITY);
        assert_eq!(lobby.connection(&others[CAPACITY - 1]).unwrap().room, None);
    }

    #[test]
    fn test_membership_count_stays_within_bounds() {
        // テスト項目: create/join/leave をどの順で繰り返しても人数は 0..=10 に収まる
        // given (前提条件):
        let mut lobby = Lobby::new();
        let ids: Vec<ConnectionId> = (0..15)
            .map(|i| connect(&mut lobby, &format!("p{i}")))
            .collect();

        // when (操作):
        for round in 0..3 {
            for (i, id) in ids.iter().enumerate() {
                if (i + round) % 4 == 0 {
                    lobby.leave_room(id);
                } else if create(&mut lobby, "R", id).is_err() {
                    let _ = lobby.join_room(&room_id("R"), id, None);
                }

                // then (期待する結果):
                if let Some(room) = lobby.room(&room_id("R")) {
                    assert!(room.member_count() >= 1);
                    assert!(room.member_count() <= CAPACITY);
                }
            }
        }
    }

    #[test]
    fn test_leave_last_member_deletes_room_and_rounds() {
        // テスト項目: 最後のメンバーが退出すると Room とラウンド状態が削除される
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        create(&mut lobby, "A1", &c1).unwrap();
        lobby
            .begin_round(
                &c1,
                RoundLocation::Fallback(Coordinate::new(1.0, 1.0).unwrap()),
                Timestamp::new(0),
            )
            .unwrap();

        // when (操作):
        let departure = lobby.leave_room(&c1).unwrap();

        // then (期待する結果):
        assert!(departure.room_deleted());
        assert!(lobby.room(&room_id("A1")).is_none());
        assert_eq!(lobby.rooms().count(), 0);

        // 同じ ID で作り直すとラウンドは 0 から始まる
        create(&mut lobby, "A1", &c1).unwrap();
        assert_eq!(lobby.room(&room_id("A1")).unwrap().round(), 0);
    }

    #[test]
    fn test_leave_when_unaffiliated_is_noop() {
        // テスト項目: どの Room にも所属していない接続の退出は何もしない
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");

        // when (操作):
        let departure = lobby.leave_room(&c1);

        // then (期待する結果):
        assert!(departure.is_none());
    }

    #[test]
    fn test_kick_scenario() {
        // テスト項目: admin のみがキックでき、キックされた側は admin をキックできない
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        let c2 = connect(&mut lobby, "bob");
        create(&mut lobby, "A1", &c1).unwrap();
        lobby.join_room(&room_id("A1"), &c2, None).unwrap();

        // when (操作):
        let kicked = lobby.kick(&room_id("A1"), &c1, &c2).unwrap();
        let counter = lobby.kick(&room_id("A1"), &c2, &c1);

        // then (期待する結果):
        assert_eq!(kicked.member.connection_id, c2);
        assert_eq!(kicked.remaining_ids(), vec![c1]);
        assert_eq!(counter, Err(RoomError::Forbidden));
        assert_eq!(lobby.connection(&c2).unwrap().room, None);
        assert_eq!(lobby.room(&room_id("A1")).unwrap().member_count(), 1);
    }

    #[test]
    fn test_kick_by_member_and_missing_target() {
        // テスト項目: 非 admin のキックは Forbidden、存在しない対象は TargetNotFound
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        let c2 = connect(&mut lobby, "bob");
        let stranger = connect(&mut lobby, "eve");
        create(&mut lobby, "A1", &c1).unwrap();
        lobby.join_room(&room_id("A1"), &c2, None).unwrap();

        // when (操作):
        let by_member = lobby.kick(&room_id("A1"), &c2, &c1);
        let missing = lobby.kick(&room_id("A1"), &c1, &stranger);

        // then (期待する結果):
        assert_eq!(by_member, Err(RoomError::Forbidden));
        assert_eq!(
            missing,
            Err(RoomError::TargetNotFound(stranger.to_string()))
        );
        assert_eq!(lobby.room(&room_id("A1")).unwrap().member_count(), 2);
    }

    #[test]
    fn test_admin_cannot_kick_themselves() {
        // テスト項目: admin による自分自身のキックは Forbidden で、admin はそのまま残る
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        let c2 = connect(&mut lobby, "bob");
        create(&mut lobby, "A1", &c1).unwrap();
        lobby.join_room(&room_id("A1"), &c2, None).unwrap();

        // when (操作):
        let result = lobby.kick(&room_id("A1"), &c1, &c1);

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::Forbidden));
        let room = lobby.room(&room_id("A1")).unwrap();
        assert_eq!(room.member_count(), 2);
        assert!(room.is_admin(&c1));
        assert_eq!(lobby.connection(&c1).unwrap().room, Some(room_id("A1")));
    }

    #[test]
    fn test_rejected_create_and_join_keep_nickname() {
        // テスト項目: 作成・参加が拒否された場合、指定したニックネームは反映されない
        // given (前提条件):
        let mut lobby = Lobby::new();
        let admin = connect(&mut lobby, "alice");
        let bob = connect(&mut lobby, "bob");
        create(&mut lobby, "A1", &admin).unwrap();
        let renamed = Nickname::new("Bobby".to_string()).unwrap();

        // when (操作):
        let create_result = lobby.create_room(
            room_id("A1"),
            &bob,
            Some(renamed.clone()),
            GameSettings::default(),
            Timestamp::new(0),
            CAPACITY,
        );
        let join_result = lobby.join_room(&room_id("nope"), &bob, Some(renamed.clone()));
        let after_rejections = lobby.connection(&bob).unwrap().nickname.clone();
        let joined = lobby
            .join_room(&room_id("A1"), &bob, Some(renamed.clone()))
            .unwrap();

        // then (期待する結果):
        assert_eq!(create_result, Err(RoomError::AlreadyExists("A1".to_string())));
        assert_eq!(join_result, Err(RoomError::NotFound("nope".to_string())));
        assert_eq!(after_rejections.as_str(), "bob");
        assert_eq!(joined.member.nickname, renamed);
        assert_eq!(lobby.connection(&bob).unwrap().nickname, renamed);
    }

    #[test]
    fn test_unregister_detaches_exactly_once() {
        // テスト項目: 切断時の退出処理は 1 回だけ実行される
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        let c2 = connect(&mut lobby, "bob");
        create(&mut lobby, "A1", &c1).unwrap();
        lobby.join_room(&room_id("A1"), &c2, None).unwrap();

        // when (操作):
        let first = lobby.unregister(&c2);
        let second = lobby.unregister(&c2);

        // then (期待する結果):
        let (_, departure) = first.unwrap();
        assert_eq!(departure.unwrap().remaining_ids(), vec![c1]);
        assert!(second.is_none());
        assert_eq!(
            lobby.join_room(&room_id("A1"), &c2, None),
            Err(RoomError::ConnectionNotFound(c2.to_string()))
        );
    }

    #[test]
    fn test_begin_round_without_room_is_not_found() {
        // テスト項目: Room 未所属でのラウンド開始は NotFound になる
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");

        // when (操作):
        let result = lobby.begin_round(
            &c1,
            RoundLocation::Fallback(Coordinate::new(0.0, 0.0).unwrap()),
            Timestamp::new(0),
        );

        // then (期待する結果):
        assert!(matches!(result, Err(RoomError::NotFound(_))));
    }

    #[test]
    fn test_remove_expired_clears_back_references() {
        // テスト項目: 期限切れ Room はメンバーがいても削除され、所属情報もクリアされる
        // given (前提条件):
        let mut lobby = Lobby::new();
        let c1 = connect(&mut lobby, "alice");
        let c2 = connect(&mut lobby, "bob");
        create(&mut lobby, "A1", &c1).unwrap();
        lobby.join_room(&room_id("A1"), &c2, None).unwrap();

        // when (操作):
        let removed = lobby.remove_expired(Timestamp::new(10), 10);

        // then (期待する結果):
        assert_eq!(removed, vec![room_id("A1")]);
        assert!(lobby.room(&room_id("A1")).is_none());
        assert_eq!(lobby.connection(&c1).unwrap().room, None);
        assert_eq!(lobby.connection(&c2).unwrap().room, None);
    }
}
