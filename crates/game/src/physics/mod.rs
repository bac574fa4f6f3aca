mod movement;
mod values;

pub use movement::{GROUND_LEVEL, SPAWN_RADIUS, move_entity, respawn};
pub use values::{ArchivedPhysicsValues, PhysicsValues};
