mod command;
mod tick;

pub use command::{CommandError, apply_player_update};
pub use tick::{MAX_TICK_DURATION, Simulation, TickClock};
