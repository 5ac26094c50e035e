//! UseCase: ラウンド開始処理
//!
//! 出題地点の優先順位は「クライアント指定 → 事前生成プール → その場で生成」。
//! 乱数生成はロックの外で行い、プールが空だった場合のみ使われる。

use std::sync::Arc;

use geoduel_shared::time::Clock;

use crate::domain::{
    ConnectionId, Coordinate, LocationGenerator, RoomError, RoomRepository, RoundLocation,
    RoundStarted, Timestamp,
};

/// ラウンド開始のユースケース
pub struct StartRoundUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn LocationGenerator>,
}

impl StartRoundUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn LocationGenerator>,
    ) -> Self {
        Self {
            repository,
            clock,
            generator,
        }
    }

    /// 呼び出し元の所属 Room で次のラウンドを開始
    ///
    /// # Arguments
    ///
    /// * `provided` - `provide_coordinates` で指定された地点
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        provided: Option<Coordinate>,
    ) -> Result<RoundStarted, RoomError> {
        let location = match provided {
            Some(coordinate) => RoundLocation::Provided(coordinate),
            None => RoundLocation::Fallback(self.generator.generate()),
        };
        let now = Timestamp::new(self.clock.now_millis());

        let started = self
            .repository
            .begin_round(connection_id, location, now)
            .await?;
        tracing::info!(
            "Round {} started in room '{}' at ({}, {})",
            started.detail.round,
            started.room.id,
            started.detail.location.lat(),
            started.detail.location.lng()
        );
        Ok(started)
    }
}
