//! Infrastructure 層
//!
//! ドメイン層の trait の具体的な実装と、通信プロトコルの DTO を提供します。

pub mod dto;
pub mod location;
pub mod message_pusher;
pub mod repository;
