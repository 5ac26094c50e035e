//! Realtime room server for geoduel.
//!
//! Clients connect over WebSocket, gather in rooms and play location guessing
//! rounds together. All room state lives in memory.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
