//! AI behaviors and the per-entity scheduler that picks between them.
//!
//! A [`Behavior`] is a stateless strategy. The [`BehaviorScheduler`] tracks
//! which behavior steers each AI entity and for how long, and invokes it once
//! per tick.

mod context;
mod random_walk;
mod registry;
mod run_away;
mod scheduler;
mod stop_near_player;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::PositionData;
use crate::time::GameDuration;

pub use context::{BehaviorContext, Neighbor};
pub use random_walk::RandomWalk;
pub use registry::{BehaviorConfig, BehaviorRegistry};
pub use run_away::RunAwayFromPlayer;
pub use scheduler::BehaviorScheduler;
pub use stop_near_player::StopNearPlayer;

pub type BehaviorRng = rand::rngs::StdRng;

/// Index of a behavior in its [`BehaviorRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BehaviorId(pub usize);

/// How strongly a behavior wants to run. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorPriority(pub u32);

impl BehaviorPriority {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(u32::MAX);

    pub const fn value(priority: u32) -> Self {
        Self(priority)
    }
}

impl fmt::Display for BehaviorPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    #[error("no target in range")]
    NoTarget,
    #[error("target overlaps entity, direction undefined")]
    DegenerateDirection,
    #[error("computed non-finite velocity")]
    NonFinite,
}

pub trait Behavior: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// How long this behavior must stay active before it may be replaced.
    fn minimum_duration(&self) -> GameDuration;

    fn can_behave(&self, ctx: &BehaviorContext<'_>) -> bool;

    /// `None` ranks below every `Some`.
    fn priority(&self, _ctx: &BehaviorContext<'_>) -> Option<BehaviorPriority> {
        None
    }

    /// Steers the acting entity by writing its velocity and facing.
    fn behave(
        &self,
        ctx: &BehaviorContext<'_>,
        rng: &mut BehaviorRng,
        motion: &mut PositionData,
    ) -> Result<(), BehaviorError>;
}

/// Writes a horizontal velocity of `speed` along `h_angle` degrees.
///
/// Heading 0 faces -z; positive angles turn towards -x.
pub(crate) fn walk_along(motion: &mut PositionData, h_angle: f32, speed: f32) {
    let (sin, cos) = h_angle.to_radians().sin_cos();
    motion.h_angle = h_angle;
    motion.v_angle = 0.0;
    motion.velocity.x = -speed * sin;
    motion.velocity.z = -speed * cos;
}
