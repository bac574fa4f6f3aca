use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// World-wide physics constants, fixed for the lifetime of a server.
///
/// Distances are in blocks, times in seconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[rkyv(derive(Debug))]
#[serde(default)]
pub struct PhysicsValues {
    /// Downward acceleration in blocks per second squared.
    pub gravity: f32,
    /// Walking speed in blocks per second.
    pub player_movement_speed: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub player_eye_height: f32,
    pub player_jump_height: f32,
}

impl Default for PhysicsValues {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            player_movement_speed: 4.5,
            player_width: 0.75,
            player_height: 1.75,
            player_eye_height: 1.6,
            player_jump_height: 1.25,
        }
    }
}

impl PhysicsValues {
    /// Initial upward speed that reaches `player_jump_height`.
    pub fn jump_velocity(&self) -> f32 {
        (2.0 * self.gravity * self.player_jump_height).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_reaches_jump_height() {
        let physics = PhysicsValues::default();
        let v = physics.jump_velocity();
        let apex = v * v / (2.0 * physics.gravity);
        assert!((apex - physics.player_jump_height).abs() < 1e-4);
    }
}
