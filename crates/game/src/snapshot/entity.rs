use std::fmt;

use glam::Vec3;

use crate::behavior::BehaviorId;
use crate::net::{EntityFlags, EntityState};
use crate::time::GameDuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an entity is and how it is moving. Angles are in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionData {
    pub position: Vec3,
    pub velocity: Vec3,
    pub h_angle: f32,
    pub v_angle: f32,
    pub is_falling: bool,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub position_data: PositionData,
    pub ai_controlled: bool,
    /// Behavior currently steering this entity, if any.
    pub active_behavior: Option<BehaviorId>,
    /// Time since `active_behavior` was last assigned.
    pub active_for: GameDuration,
}

impl Entity {
    pub fn ai(id: EntityId, position_data: PositionData) -> Self {
        Self {
            id,
            position_data,
            ai_controlled: true,
            active_behavior: None,
            active_for: GameDuration::ZERO,
        }
    }

    pub fn player(id: EntityId, position_data: PositionData) -> Self {
        Self {
            ai_controlled: false,
            ..Self::ai(id, position_data)
        }
    }

    pub fn flags(&self) -> EntityFlags {
        let mut flags = EntityFlags::empty();
        flags.set(EntityFlags::AI_CONTROLLED, self.ai_controlled);
        flags.set(EntityFlags::FALLING, self.position_data.is_falling);
        flags
    }

    pub fn to_network_state(&self) -> EntityState {
        let data = &self.position_data;
        EntityState {
            entity_id: self.id.0,
            position: data.position.to_array(),
            velocity: data.velocity.to_array(),
            h_angle: data.h_angle,
            v_angle: data.v_angle,
            flags: self.flags().bits(),
        }
    }
}
