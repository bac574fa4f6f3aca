pub mod behavior;
pub mod net;
pub mod physics;
pub mod simulation;
pub mod snapshot;
pub mod sync;
pub mod time;

pub use behavior::{
    Behavior, BehaviorConfig, BehaviorContext, BehaviorError, BehaviorId, BehaviorPriority,
    BehaviorRegistry, BehaviorScheduler, Neighbor,
};
pub use net::{
    BlockUpdate, ChannelError, ClientError, ClientMessage, DEFAULT_PORT, DEFAULT_TICK_RATE,
    EntityFlags, EntityState, FramedChannel, GameClient, MAGIC_COOKIE, MAX_BLOCK_UPDATES_PER_TICK,
    MAX_ENTITIES_PER_UPDATE, MAX_OBJECT_SIZE, PlayerUpdate, ServerMessage, WireObject,
    WorldUpdate,
};
pub use physics::PhysicsValues;
pub use simulation::{CommandError, Simulation, TickClock, apply_player_update};
pub use snapshot::{BlockLog, Entity, EntityId, PositionData, World};
pub use sync::{NormalGuard, PriorityGuard, PriorityMutex};
pub use time::GameDuration;
