pub mod config;
pub mod events;
pub mod logging;
pub mod server;
pub mod state;

mod connection;
mod simulation;

pub use config::{ConfigError, ServerConfig};
pub use events::{DisconnectReason, ServerEvent};
pub use server::{GameServer, RunningServer, ServerStats};
