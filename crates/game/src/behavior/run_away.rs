use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorContext, BehaviorError, BehaviorPriority, BehaviorRng, walk_along};
use crate::snapshot::PositionData;
use crate::time::GameDuration;

/// Flees straight away from the nearest player in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunAwayFromPlayer {
    pub priority: u32,
    /// Seconds.
    pub minimum_duration: f64,
    /// Blocks.
    pub radius: f32,
    /// Fraction of the player movement speed.
    pub speed_factor: f32,
}

impl Default for RunAwayFromPlayer {
    fn default() -> Self {
        Self {
            priority: 2,
            minimum_duration: 1.0,
            radius: 8.0,
            speed_factor: 0.25,
        }
    }
}

impl Behavior for RunAwayFromPlayer {
    fn name(&self) -> &'static str {
        "run_away_from_player"
    }

    fn minimum_duration(&self) -> GameDuration {
        GameDuration::from_secs(self.minimum_duration)
    }

    fn can_behave(&self, ctx: &BehaviorContext<'_>) -> bool {
        ctx.player_within(self.radius)
    }

    fn priority(&self, _ctx: &BehaviorContext<'_>) -> Option<BehaviorPriority> {
        Some(BehaviorPriority::value(self.priority))
    }

    fn behave(
        &self,
        ctx: &BehaviorContext<'_>,
        _rng: &mut BehaviorRng,
        motion: &mut PositionData,
    ) -> Result<(), BehaviorError> {
        // Keeps running for the rest of the hold even once out of range.
        let (player, _) = ctx.nearest_player().ok_or(BehaviorError::NoTarget)?;

        let away = ctx.position - player.position;
        let away = Vec3::new(away.x, 0.0, away.z);
        if away.length_squared() < 1e-6 {
            return Err(BehaviorError::DegenerateDirection);
        }

        // walk_along moves along (-sin h, -cos h).
        let heading = (-away.x).atan2(-away.z).to_degrees().rem_euclid(360.0);
        let speed = self.speed_factor * ctx.physics.player_movement_speed;
        walk_along(motion, heading, speed);
        Ok(())
    }
}
