mod client;
mod framing;
mod protocol;

pub use client::{ClientError, GameClient};
pub use framing::{ChannelError, FramedChannel, MAX_OBJECT_SIZE};
pub use protocol::{
    ArchivedClientMessage, ArchivedServerMessage, BlockUpdate, ClientMessage, DEFAULT_PORT,
    DEFAULT_TICK_RATE, EntityFlags, EntityState, MAGIC_COOKIE, MAX_BLOCK_UPDATES_PER_TICK,
    MAX_ENTITIES_PER_UPDATE, PROTOCOL_VERSION, PlayerUpdate, ServerMessage, WireObject,
    WorldUpdate,
};
