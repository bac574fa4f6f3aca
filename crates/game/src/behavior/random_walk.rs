use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorContext, BehaviorError, BehaviorPriority, BehaviorRng, walk_along};
use crate::snapshot::PositionData;
use crate::time::GameDuration;

/// Wanders at a slow walk, occasionally picking a new heading.
///
/// Per tick of length `dt`, a fresh heading is drawn with probability about
/// `dt / mean_turn_interval`; failing that, the heading is nudged by up to
/// `max_jitter` degrees with probability about `dt / mean_jitter_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalk {
    pub priority: u32,
    /// Seconds.
    pub minimum_duration: f64,
    /// Fraction of the player movement speed.
    pub speed_factor: f32,
    pub mean_turn_interval: f64,
    pub mean_jitter_interval: f64,
    /// Degrees.
    pub max_jitter: f32,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            priority: 1,
            minimum_duration: 0.0,
            speed_factor: 0.125,
            mean_turn_interval: 10.0,
            mean_jitter_interval: 1.0,
            max_jitter: 15.0,
        }
    }
}

/// Sample of the unit-mean exponential distribution.
fn next_exp(rng: &mut BehaviorRng) -> f64 {
    let u: f64 = rng.random();
    -(1.0 - u).ln()
}

impl Behavior for RandomWalk {
    fn name(&self) -> &'static str {
        "random_walk"
    }

    fn minimum_duration(&self) -> GameDuration {
        GameDuration::from_secs(self.minimum_duration)
    }

    fn can_behave(&self, _ctx: &BehaviorContext<'_>) -> bool {
        true
    }

    fn priority(&self, _ctx: &BehaviorContext<'_>) -> Option<BehaviorPriority> {
        Some(BehaviorPriority::value(self.priority))
    }

    fn behave(
        &self,
        ctx: &BehaviorContext<'_>,
        rng: &mut BehaviorRng,
        motion: &mut PositionData,
    ) -> Result<(), BehaviorError> {
        let dt = ctx.tick_duration.as_secs();
        let mut heading = motion.h_angle;
        if dt >= self.mean_turn_interval * next_exp(rng) {
            heading = rng.random_range(0.0..360.0);
        } else if dt > self.mean_jitter_interval * next_exp(rng) && self.max_jitter > 0.0 {
            heading += rng.random_range(-self.max_jitter..=self.max_jitter);
        }

        let mut heading = heading.rem_euclid(360.0);
        if heading >= 360.0 {
            heading = 0.0;
        }

        let speed = self.speed_factor * ctx.physics.player_movement_speed;
        walk_along(motion, heading, speed);
        if !motion.velocity.is_finite() {
            return Err(BehaviorError::NonFinite);
        }
        Ok(())
    }
}
