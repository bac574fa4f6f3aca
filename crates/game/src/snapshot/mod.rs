mod blocks;
mod entity;
mod world;

pub use blocks::BlockLog;
pub use entity::{Entity, EntityId, PositionData};
pub use world::World;
