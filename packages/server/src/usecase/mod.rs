//! UseCase 層
//!
//! ドメインモデルとリポジトリを組み合わせてアプリケーションの操作を実装します。
//! ワイヤーフォーマットには依存せず、結果はドメインモデルで返します。

mod connect_client;
mod create_room;
mod disconnect_client;
mod expire_rooms;
mod join_room;
mod kick_player;
mod leave_room;
mod list_rooms;
mod pre_generate_locations;
mod send_message;
mod start_game;
mod start_round;
mod submit_answer;

pub use connect_client::ConnectClientUseCase;
pub use create_room::{CreateRoomInput, CreateRoomUseCase};
pub use disconnect_client::DisconnectClientUseCase;
pub use expire_rooms::ExpireRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use kick_player::KickPlayerUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use pre_generate_locations::PreGenerateLocationsUseCase;
pub use send_message::SendMessageUseCase;
pub use start_game::StartGameUseCase;
pub use start_round::StartRoundUseCase;
pub use submit_answer::{AnswerSubmitted, MeasuredAnswer, SubmitAnswerUseCase};
