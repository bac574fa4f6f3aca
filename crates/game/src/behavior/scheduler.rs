use std::sync::Arc;

use rand::SeedableRng;

use super::{BehaviorContext, BehaviorId, BehaviorPriority, BehaviorRegistry, BehaviorRng, Neighbor};
use crate::physics::PhysicsValues;
use crate::snapshot::{Entity, World};
use crate::time::GameDuration;

/// Picks and runs at most one behavior per AI entity per tick.
///
/// The behavior currently steering an entity is kept while it can still run
/// and its minimum duration has not elapsed. Once the hold is met, every
/// registered behavior that can run is ranked by priority and the best one is
/// taken, earlier registration winning ties. Switching resets the entity's
/// timer; keeping the same behavior does not.
#[derive(Debug)]
pub struct BehaviorScheduler {
    registry: Arc<BehaviorRegistry>,
    rng: BehaviorRng,
}

impl BehaviorScheduler {
    pub fn new(registry: Arc<BehaviorRegistry>) -> Self {
        Self {
            registry,
            rng: BehaviorRng::from_os_rng(),
        }
    }

    pub fn with_seed(registry: Arc<BehaviorRegistry>, seed: u64) -> Self {
        Self {
            registry,
            rng: BehaviorRng::seed_from_u64(seed),
        }
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Runs every AI entity in `world` for one tick.
    ///
    /// Behaviors see entity positions as they were when the pass started.
    pub fn run(&mut self, world: &mut World, physics: &PhysicsValues, tick_duration: GameDuration) {
        let neighbors = world.neighbors();
        for entity in world.entities_mut().filter(|e| e.ai_controlled) {
            self.control(entity, physics, tick_duration, &neighbors);
        }
    }

    /// Advances one entity's behavior timer, reselects if allowed, and runs
    /// the selected behavior. Returns the behavior that ran, if any.
    pub fn control(
        &mut self,
        entity: &mut Entity,
        physics: &PhysicsValues,
        tick_duration: GameDuration,
        neighbors: &[Neighbor],
    ) -> Option<BehaviorId> {
        entity.active_for += tick_duration;

        let mut ctx = BehaviorContext {
            physics,
            tick_duration,
            active_for: entity.active_for,
            entity: entity.id,
            position: entity.position_data.position,
            neighbors,
        };

        let active = entity
            .active_behavior
            .and_then(|id| self.registry.get(id).map(|behavior| (id, behavior)));

        let selected = match active {
            Some((id, behavior)) if entity.active_for < behavior.minimum_duration() => {
                if !behavior.can_behave(&ctx) {
                    // Held but no longer able to run: idle this tick.
                    return None;
                }
                Some(id)
            }
            _ => self.select(&ctx),
        };

        if selected != entity.active_behavior || selected.is_none() {
            if let Some(id) = selected {
                log::trace!("entity {} switches to behavior {:?}", entity.id, id);
            }
            entity.active_behavior = selected;
            entity.active_for = GameDuration::ZERO;
            ctx.active_for = GameDuration::ZERO;
        }

        let id = selected?;
        let behavior = self.registry.get(id)?;

        let mut motion = entity.position_data;
        match behavior.behave(&ctx, &mut self.rng, &mut motion) {
            Ok(()) => {
                let data = &mut entity.position_data;
                data.velocity = motion.velocity;
                data.h_angle = motion.h_angle;
                data.v_angle = motion.v_angle;
            }
            Err(err) => {
                log::warn!(
                    "behavior {} failed for entity {}: {}",
                    behavior.name(),
                    entity.id,
                    err
                );
            }
        }
        Some(id)
    }

    /// Highest-priority eligible behavior; earlier registration wins ties.
    fn select(&self, ctx: &BehaviorContext<'_>) -> Option<BehaviorId> {
        let mut best: Option<(BehaviorId, Option<BehaviorPriority>)> = None;
        for (id, behavior) in self.registry.iter() {
            if !behavior.can_behave(ctx) {
                continue;
            }
            let priority = behavior.priority(ctx);
            match best {
                Some((_, best_priority)) if priority <= best_priority => {}
                _ => best = Some((id, priority)),
            }
        }
        best.map(|(id, _)| id)
    }
}
