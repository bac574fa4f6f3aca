mod gate;
mod priority_mutex;

pub use gate::{Gate, GatePass};
pub use priority_mutex::{NormalGuard, PriorityGuard, PriorityMutex};
