//! UseCase: 回答の提出
//!
//! ### どのような状況を想定しているか
//! - 正常系：距離付きで現在のラウンドに記録される
//! - 準正常系：距離の取得に失敗しても距離なしで記録される
//! - 異常系：ラウンド未開始・Room 未所属

use std::sync::Arc;

use crate::domain::{
    Answer, ConnectionId, Coordinate, DistanceLookup, RoomError, RoomId, RoomRepository,
    RoomSnapshot,
};

/// Result of a recorded answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSubmitted {
    /// Room state right after the answer was recorded.
    pub room: RoomSnapshot,
    pub round: u32,
    pub answer: Answer,
}

/// An answer whose distance has been looked up but which is not recorded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredAnswer {
    room_id: RoomId,
    round: u32,
    answer: Answer,
}

/// 回答提出のユースケース
///
/// 距離の取得（`measure`）と記録（`record`）を分けて呼び出す。呼び出し側は
/// 外部サービスを待つ間に配信順序のガードを保持しなくて済む。
pub struct SubmitAnswerUseCase {
    repository: Arc<dyn RoomRepository>,
    distance: Arc<dyn DistanceLookup>,
}

impl SubmitAnswerUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, distance: Arc<dyn DistanceLookup>) -> Self {
        Self {
            repository,
            distance,
        }
    }

    /// 現在のラウンドを特定し、正解地点までの距離を取得する
    pub async fn measure(
        &self,
        connection_id: &ConnectionId,
        location: Coordinate,
    ) -> Result<MeasuredAnswer, RoomError> {
        let target = self.repository.get_answer_target(connection_id).await?;

        // 外部サービスの呼び出しはロックの外で行う
        let distance_m = match self
            .distance
            .walking_distance(location, target.location)
            .await
        {
            Ok(meters) => Some(meters),
            Err(e) => {
                tracing::warn!(
                    "Distance lookup failed for '{}' in room '{}': {}",
                    connection_id,
                    target.room_id,
                    e
                );
                None
            }
        };

        Ok(MeasuredAnswer {
            room_id: target.room_id,
            round: target.round,
            answer: Answer {
                connection_id: *connection_id,
                nickname: target.nickname,
                location,
                distance_m,
            },
        })
    }

    /// 計測済みの回答を、計測時のラウンドに記録する
    pub async fn record(&self, measured: MeasuredAnswer) -> Result<AnswerSubmitted, RoomError> {
        let MeasuredAnswer {
            room_id,
            round,
            answer,
        } = measured;
        let room = self
            .repository
            .record_answer(&room_id, round, answer.clone())
            .await?;

        Ok(AnswerSubmitted {
            room,
            round,
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DistanceError, RoundLocation, Timestamp, location::MockDistanceLookup,
    };
    use crate::usecase::test_support::{connect, create_room_at, create_test_repository, room_id};

    fn coordinate(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    async fn submit(
        usecase: &SubmitAnswerUseCase,
        connection_id: &ConnectionId,
        location: Coordinate,
    ) -> Result<AnswerSubmitted, RoomError> {
        let measured = usecase.measure(connection_id, location).await?;
        usecase.record(measured).await
    }

    #[tokio::test]
    async fn test_submit_answer_records_distance() {
        // テスト項目: 回答が距離付きで現在のラウンドに記録される
        // given (前提条件):
        let repository = create_test_repository();
        let mut distance = MockDistanceLookup::new();
        distance
            .expect_walking_distance()
            .withf(|from, to| from.lat() == 47.07 && to.lat() == 48.2)
            .times(1)
            .returning(|_, _| Ok(1_234.5));
        let usecase = SubmitAnswerUseCase::new(repository.clone(), Arc::new(distance));
        let alice = connect(&repository, "alice").await;
        let bob = connect(&repository, "bob").await;
        create_room_at(&repository, "A1", &alice, 0).await;
        repository.join_room(&room_id("A1"), &bob, None).await.unwrap();
        repository
            .begin_round(
                &alice,
                RoundLocation::Provided(coordinate(48.2, 16.37)),
                Timestamp::new(0),
            )
            .await
            .unwrap();

        // when (操作):
        let submitted = submit(&usecase, &bob, coordinate(47.07, 15.44))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(submitted.round, 1);
        assert_eq!(submitted.answer.nickname.as_str(), "bob");
        assert_eq!(submitted.answer.distance_m, Some(1_234.5));
        assert_eq!(submitted.room.member_ids(), vec![alice, bob]);
    }

    #[tokio::test]
    async fn test_submit_answer_without_distance_on_lookup_failure() {
        // テスト項目: 距離の取得に失敗しても回答は distance なしで記録される
        // given (前提条件):
        let repository = create_test_repository();
        let mut distance = MockDistanceLookup::new();
        distance
            .expect_walking_distance()
            .returning(|_, _| Err(DistanceError::Unavailable("timeout".to_string())));
        let usecase = SubmitAnswerUseCase::new(repository.clone(), Arc::new(distance));
        let alice = connect(&repository, "alice").await;
        create_room_at(&repository, "A1", &alice, 0).await;
        repository
            .begin_round(
                &alice,
                RoundLocation::Provided(coordinate(0.0, 0.0)),
                Timestamp::new(0),
            )
            .await
            .unwrap();

        // when (操作):
        let submitted = submit(&usecase, &alice, coordinate(1.0, 1.0)).await.unwrap();

        // then (期待する結果):
        assert_eq!(submitted.answer.distance_m, None);
        assert_eq!(submitted.round, 1);
    }

    #[tokio::test]
    async fn test_submit_answer_before_first_round() {
        // テスト項目: ラウンド開始前の回答は NoRoundInProgress になり、距離は問い合わせない
        // given (前提条件):
        let repository = create_test_repository();
        let mut distance = MockDistanceLookup::new();
        distance.expect_walking_distance().never();
        let usecase = SubmitAnswerUseCase::new(repository.clone(), Arc::new(distance));
        let alice = connect(&repository, "alice").await;
        create_room_at(&repository, "A1", &alice, 0).await;

        // when (操作):
        let result = submit(&usecase, &alice, coordinate(1.0, 1.0)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomError::NoRoundInProgress("A1".to_string()))
        );
    }
}
