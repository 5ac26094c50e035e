//! UseCase: 出題地点の事前生成
//!
//! 生成した地点で呼び出し元の Room のプールを置き換える（追加ではない）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Coordinate, LocationGenerator, RoomError, RoomId, RoomPolicy, RoomRepository,
};

pub struct PreGenerateLocationsUseCase {
    repository: Arc<dyn RoomRepository>,
    generator: Arc<dyn LocationGenerator>,
    policy: RoomPolicy,
}

impl PreGenerateLocationsUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        generator: Arc<dyn LocationGenerator>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            repository,
            generator,
            policy,
        }
    }

    /// プールを `count` 件の新しい地点で置き換え、対象 Room と件数を返す
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        count: usize,
    ) -> Result<(RoomId, usize), RoomError> {
        if count > self.policy.max_pre_generated {
            return Err(RoomError::MalformedPayload(format!(
                "count must be at most {}",
                self.policy.max_pre_generated
            )));
        }

        let locations: Vec<Coordinate> = (0..count).map(|_| self.generator.generate()).collect();
        let room_id = self
            .repository
            .replace_pending_locations(connection_id, locations)
            .await?;
        tracing::debug!("Pre-generated {} locations for room '{}'", count, room_id);
        Ok((room_id, count))
    }
}
