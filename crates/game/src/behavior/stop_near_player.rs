use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorContext, BehaviorError, BehaviorPriority, BehaviorRng};
use crate::snapshot::PositionData;
use crate::time::GameDuration;

/// Stands still while a player is close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopNearPlayer {
    pub priority: u32,
    /// Seconds.
    pub minimum_duration: f64,
    /// Blocks.
    pub radius: f32,
}

impl Default for StopNearPlayer {
    fn default() -> Self {
        Self {
            priority: 4,
            minimum_duration: 2.0,
            radius: 4.0,
        }
    }
}

impl Behavior for StopNearPlayer {
    fn name(&self) -> &'static str {
        "stop_near_player"
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
        _ctx: &BehaviorContext<'_>,
        _rng: &mut BehaviorRng,
        motion: &mut PositionData,
    ) -> Result<(), BehaviorError> {
        motion.velocity.x = 0.0;
        motion.velocity.z = 0.0;
        Ok(())
    }
}
