use bitflags::bitflags;
use glam::Vec3;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use super::framing::MAX_OBJECT_SIZE;
use crate::physics::PhysicsValues;
use crate::snapshot::PositionData;

pub const DEFAULT_PORT: u16 = 26031;
pub const DEFAULT_TICK_RATE: u32 = 100;
pub const PROTOCOL_VERSION: [u8; 4] = [0, 0, 0, 7];

/// Sent by the client before the first frame: `CubeHack` followed by the
/// protocol version.
pub const MAGIC_COOKIE: [u8; 12] = [
    b'C', b'u', b'b', b'e', b'H', b'a', b'c', b'k',
    PROTOCOL_VERSION[0], PROTOCOL_VERSION[1], PROTOCOL_VERSION[2], PROTOCOL_VERSION[3],
];

/// Block edits carried by one world update; the rest wait for later ticks.
pub const MAX_BLOCK_UPDATES_PER_TICK: usize = 256;

/// Archive bytes of a world update beyond its two arrays.
const WORLD_UPDATE_OVERHEAD: usize = 64;

/// Most entities a world update can carry next to a full batch of block edits
/// and still fit in one frame.
pub const MAX_ENTITIES_PER_UPDATE: usize = (MAX_OBJECT_SIZE
    - WORLD_UPDATE_OVERHEAD
    - MAX_BLOCK_UPDATES_PER_TICK * size_of::<ArchivedBlockUpdate>())
    / size_of::<ArchivedEntityState>();

/// A message type that can travel inside a frame.
pub trait WireObject: Sized {
    fn encode(&self) -> Result<Vec<u8>, rancor::Error>;
    fn decode(data: &[u8]) -> Result<Self, rancor::Error>;
}

macro_rules! wire_object {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl WireObject for $ty {
                fn encode(&self) -> Result<Vec<u8>, rancor::Error> {
                    rkyv::to_bytes::<rancor::Error>(self).map(|aligned| aligned.into_vec())
                }

                fn decode(data: &[u8]) -> Result<Self, rancor::Error> {
                    // Archives must be read from an aligned buffer.
                    let mut aligned = AlignedVec::<16>::with_capacity(data.len());
                    aligned.extend_from_slice(data);
                    rkyv::from_bytes::<Self, rancor::Error>(&aligned)
                }
            }
        )+
    };
}

wire_object!(ClientMessage, ServerMessage);

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ClientMessage {
    PlayerUpdate(PlayerUpdate),
    BlockUpdates(Vec<BlockUpdate>),
    Ping { timestamp_ms: u64 },
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ServerMessage {
    Welcome {
        entity_id: u32,
        tick_rate: u32,
        physics: PhysicsValues,
    },
    ConnectionDenied {
        reason: String,
    },
    WorldUpdate(WorldUpdate),
    Pong {
        timestamp_ms: u64,
    },
}

/// Client-authoritative state of the sender's own player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerUpdate {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub h_angle: f32,
    pub v_angle: f32,
    pub is_falling: bool,
}

impl From<&PositionData> for PlayerUpdate {
    fn from(data: &PositionData) -> Self {
        Self {
            position: data.position.to_array(),
            velocity: data.velocity.to_array(),
            h_angle: data.h_angle,
            v_angle: data.v_angle,
            is_falling: data.is_falling,
        }
    }
}

impl From<&PlayerUpdate> for PositionData {
    fn from(update: &PlayerUpdate) -> Self {
        Self {
            position: Vec3::from_array(update.position),
            velocity: Vec3::from_array(update.velocity),
            h_angle: update.h_angle,
            v_angle: update.v_angle,
            is_falling: update.is_falling,
        }
    }
}

impl PlayerUpdate {
    /// Rejects NaN and infinite components.
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(&self.velocity).all(|v| v.is_finite())
            && self.h_angle.is_finite()
            && self.v_angle.is_finite()
    }
}

/// One block edit: `material` is what now occupies `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BlockUpdate {
    pub pos: [i32; 3],
    pub material: u16,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityFlags: u8 {
        const AI_CONTROLLED = 1 << 0;
        const FALLING = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EntityState {
    pub entity_id: u32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub h_angle: f32,
    pub v_angle: f32,
    pub flags: u8,
}

impl EntityState {
    pub fn flags(&self) -> EntityFlags {
        EntityFlags::from_bits_truncate(self.flags)
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldUpdate {
    pub tick: u64,
    pub entities: Vec<EntityState>,
    /// Block edits the receiver has not seen yet, oldest first.
    pub blocks: Vec<BlockUpdate>,
}

impl WorldUpdate {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            entities: Vec::new(),
            blocks: Vec::new(),
        }
    }
}
