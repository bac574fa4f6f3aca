use glam::Vec3;

use crate::physics::PhysicsValues;
use crate::snapshot::EntityId;
use crate::time::GameDuration;

/// What a behavior may know about another entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: EntityId,
    pub position: Vec3,
    pub ai_controlled: bool,
}

/// Read-only view handed to behaviors for one entity on one tick.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext<'a> {
    pub physics: &'a PhysicsValues,
    /// Game time covered by this tick.
    pub tick_duration: GameDuration,
    /// How long the entity's current behavior has been active.
    pub active_for: GameDuration,
    pub entity: EntityId,
    pub position: Vec3,
    /// Every entity in the world as of the start of the tick, possibly
    /// including the acting one.
    pub neighbors: &'a [Neighbor],
}

impl<'a> BehaviorContext<'a> {
    pub fn others(&self) -> impl Iterator<Item = &'a Neighbor> + use<'a> {
        let me = self.entity;
        self.neighbors.iter().filter(move |n| n.id != me)
    }

    /// Closest player-controlled entity and its distance.
    pub fn nearest_player(&self) -> Option<(&'a Neighbor, f32)> {
        let position = self.position;
        self.others()
            .filter(|n| !n.ai_controlled)
            .map(|n| (n, n.position.distance(position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn player_within(&self, radius: f32) -> bool {
        self.nearest_player()
            .is_some_and(|(_, distance)| distance < radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(id: u32, x: f32, ai_controlled: bool) -> Neighbor {
        Neighbor {
            id: EntityId(id),
            position: Vec3::new(x, 0.0, 0.0),
            ai_controlled,
        }
    }

    #[test]
    fn nearest_player_skips_self_and_ai() {
        let physics = PhysicsValues::default();
        let neighbors = [
            neighbor(1, 0.0, false),
            neighbor(2, 1.0, true),
            neighbor(3, 6.0, false),
            neighbor(4, -3.0, false),
        ];
        let ctx = BehaviorContext {
            physics: &physics,
            tick_duration: GameDuration::from_secs(0.01),
            active_for: GameDuration::ZERO,
            entity: EntityId(1),
            position: Vec3::ZERO,
            neighbors: &neighbors,
        };

        let (nearest, distance) = ctx.nearest_player().unwrap();
        assert_eq!(nearest.id, EntityId(4));
        assert_eq!(distance, 3.0);
        assert!(ctx.player_within(4.0));
        assert!(!ctx.player_within(3.0));
        assert_eq!(ctx.others().count(), 3);
    }
}
