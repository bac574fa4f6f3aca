use std::collections::BTreeMap;

use rand::Rng;

use crate::behavior::Neighbor;
use crate::net::WorldUpdate;
use crate::physics;

use super::entity::{Entity, EntityId, PositionData};

/// Every entity in the simulation, iterated in id order.
#[derive(Debug)]
pub struct World {
    tick: u64,
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            tick: 0,
            entities: BTreeMap::new(),
            next_entity_id: 1,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Adds an AI entity at a random point in the spawn square.
    pub fn spawn_ai<R: Rng>(&mut self, rng: &mut R) -> EntityId {
        let id = self.allocate_id();
        let mut position_data = PositionData::default();
        physics::respawn(rng, &mut position_data);
        self.entities.insert(id, Entity::ai(id, position_data));
        id
    }

    pub fn spawn_player(&mut self, position_data: PositionData) -> EntityId {
        let id = self.allocate_id();
        self.entities.insert(id, Entity::player(id, position_data));
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn player_count(&self) -> usize {
        self.entities.values().filter(|e| !e.ai_controlled).count()
    }

    /// Position summary of every entity, as seen by behaviors this tick.
    pub fn neighbors(&self) -> Vec<Neighbor> {
        self.entities
            .values()
            .map(|entity| Neighbor {
                id: entity.id,
                position: entity.position_data.position,
                ai_controlled: entity.ai_controlled,
            })
            .collect()
    }

    /// State of every entity except `viewer`, which the client drives itself.
    pub fn update_for(&self, viewer: Option<EntityId>) -> WorldUpdate {
        let entities = self
            .entities
            .values()
            .filter(|entity| Some(entity.id) != viewer)
            .map(Entity::to_network_state)
            .collect();
        WorldUpdate {
            tick: self.tick,
            entities,
            blocks: Vec::new(),
        }
    }

    /// Next free id. Wraps past `u32::MAX` back to 1, skipping ids still in
    /// use.
    fn allocate_id(&mut self) -> EntityId {
        loop {
            let id = EntityId(self.next_entity_id);
            self.next_entity_id = self.next_entity_id.checked_add(1).unwrap_or(1);
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }
}
