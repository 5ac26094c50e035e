//! Utilities shared by the geoduel binaries and libraries.

pub mod logger;
pub mod time;
