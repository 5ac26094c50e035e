//! Server state shared by every handler.

use std::sync::Arc;

use geoduel_shared::time::Clock;

use crate::{
    domain::{DistanceLookup, LocationGenerator, MessagePusher, RoomPolicy, RoomRepository},
    usecase::{
        ConnectClientUseCase, CreateRoomUseCase, DisconnectClientUseCase, ExpireRoomsUseCase,
        JoinRoomUseCase, KickPlayerUseCase, LeaveRoomUseCase, ListRoomsUseCase,
        PreGenerateLocationsUseCase, SendMessageUseCase, StartGameUseCase, StartRoundUseCase,
        SubmitAnswerUseCase,
    },
};

use super::broadcast::BroadcastRouter;

/// Shared application state
pub struct AppState {
    pub connect_client_usecase: ConnectClientUseCase,
    pub disconnect_client_usecase: DisconnectClientUseCase,
    pub create_room_usecase: CreateRoomUseCase,
    pub join_room_usecase: JoinRoomUseCase,
    pub leave_room_usecase: LeaveRoomUseCase,
    pub kick_player_usecase: KickPlayerUseCase,
    pub list_rooms_usecase: ListRoomsUseCase,
    pub start_game_usecase: StartGameUseCase,
    pub pre_generate_locations_usecase: PreGenerateLocationsUseCase,
    pub start_round_usecase: StartRoundUseCase,
    pub send_message_usecase: SendMessageUseCase,
    pub submit_answer_usecase: SubmitAnswerUseCase,
    pub expire_rooms_usecase: ExpireRoomsUseCase,
    pub broadcast: BroadcastRouter,
}

impl AppState {
    /// Wire every use case to the given collaborators.
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn LocationGenerator>,
        distance: Arc<dyn DistanceLookup>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            connect_client_usecase: ConnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            disconnect_client_usecase: DisconnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            create_room_usecase: CreateRoomUseCase::new(repository.clone(), clock.clone(), policy),
            join_room_usecase: JoinRoomUseCase::new(repository.clone()),
            leave_room_usecase: LeaveRoomUseCase::new(repository.clone()),
            kick_player_usecase: KickPlayerUseCase::new(repository.clone()),
            list_rooms_usecase: ListRoomsUseCase::new(repository.clone(), clock.clone(), policy),
            start_game_usecase: StartGameUseCase::new(repository.clone()),
            pre_generate_locations_usecase: PreGenerateLocationsUseCase::new(
                repository.clone(),
                generator.clone(),
                policy,
            ),
            start_round_usecase: StartRoundUseCase::new(
                repository.clone(),
                clock.clone(),
                generator,
            ),
            send_message_usecase: SendMessageUseCase::new(repository.clone()),
            submit_answer_usecase: SubmitAnswerUseCase::new(repository.clone(), distance),
            expire_rooms_usecase: ExpireRoomsUseCase::new(repository, clock, policy),
            broadcast: BroadcastRouter::new(message_pusher),
        }
    }
}
