use glam::Vec3;
use rand::Rng;

use super::PhysicsValues;
use crate::snapshot::PositionData;
use crate::time::GameDuration;

/// Half-width of the square AI entities respawn in, centred on the origin.
pub const SPAWN_RADIUS: f32 = 32.0;

/// Height of the flat ground plane.
pub const GROUND_LEVEL: f32 = 0.0;

/// Places an entity at a random point on the ground within the spawn square.
pub fn respawn<R: Rng>(rng: &mut R, position_data: &mut PositionData) {
    position_data.position = Vec3::new(
        rng.random_range(-SPAWN_RADIUS..=SPAWN_RADIUS),
        GROUND_LEVEL,
        rng.random_range(-SPAWN_RADIUS..=SPAWN_RADIUS),
    );
    position_data.velocity = Vec3::ZERO;
    position_data.is_falling = false;
}

/// Advances one entity by `elapsed` under gravity, landing on the ground
/// plane.
///
/// Gravity is applied in two half steps around the position update so a
/// constant-acceleration fall is integrated exactly.
pub fn move_entity(physics: &PhysicsValues, position_data: &mut PositionData, elapsed: GameDuration) {
    let dt = elapsed.as_secs_f32();
    if dt <= 0.0 {
        return;
    }

    let mut velocity = position_data.velocity;
    velocity.y -= 0.5 * dt * physics.gravity;

    let mut position = position_data.position + velocity * dt;
    if position.y <= GROUND_LEVEL {
        position.y = GROUND_LEVEL;
        velocity.y = 0.0;
        position_data.is_falling = false;
    } else {
        velocity.y -= 0.5 * dt * physics.gravity;
        position_data.is_falling = true;
    }

    position_data.position = position;
    position_data.velocity = velocity;
}
