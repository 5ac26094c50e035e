//! UI 層
//!
//! WebSocket / HTTP の入り口と、イベントのデコード・配信を担当します。

mod broadcast;
mod dispatcher;
mod handler;
mod server;
mod signal;
pub mod state;
mod sweeper;

pub use broadcast::BroadcastRouter;
pub use server::{Server, ServerConfig};
pub use state::AppState;
