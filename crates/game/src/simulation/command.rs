use crate::net::PlayerUpdate;
use crate::snapshot::{EntityId, PositionData, World};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommandError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),
    #[error("entity {0} is AI-controlled")]
    NotAPlayer(EntityId),
    #[error("update contains non-finite values")]
    NonFinite,
}

/// Overwrites a player's position data with what its client reported.
///
/// Players are client-authoritative: the server trusts reported positions
/// and only refuses values that would poison the simulation.
pub fn apply_player_update(
    world: &mut World,
    entity_id: EntityId,
    update: &PlayerUpdate,
) -> Result<(), CommandError> {
    if !update.is_finite() {
        return Err(CommandError::NonFinite);
    }

    let entity = world
        .get_mut(entity_id)
        .ok_or(CommandError::UnknownEntity(entity_id))?;
    if entity.ai_controlled {
        return Err(CommandError::NotAPlayer(entity_id));
    }

    entity.position_data = PositionData::from(update);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn update_replaces_player_position() {
        let mut world = World::new();
        let player = world.spawn_player(PositionData::default());
        let update = PlayerUpdate {
            position: [4.0, 1.0, -2.0],
            velocity: [0.0, 3.0, 0.0],
            h_angle: 180.0,
            v_angle: 5.0,
            is_falling: true,
        };

        apply_player_update(&mut world, player, &update).unwrap();
        let data = world.get(player).unwrap().position_data;
        assert_eq!(data.position, Vec3::new(4.0, 1.0, -2.0));
        assert_eq!(data.h_angle, 180.0);
        assert!(data.is_falling);
    }

    #[test]
    fn rejects_bad_targets_and_values() {
        let mut world = World::new();
        let ai = world.spawn_ai(&mut StdRng::seed_from_u64(0));
        let player = world.spawn_player(PositionData::default());

        assert_eq!(
            apply_player_update(&mut world, ai, &PlayerUpdate::default()),
            Err(CommandError::NotAPlayer(ai))
        );
        assert_eq!(
            apply_player_update(&mut world, EntityId(99), &PlayerUpdate::default()),
            Err(CommandError::UnknownEntity(EntityId(99)))
        );

        let poisoned = PlayerUpdate {
            position: [f32::INFINITY, 0.0, 0.0],
            ..Default::default()
        };
        assert_eq!(
            apply_player_update(&mut world, player, &poisoned),
            Err(CommandError::NonFinite)
        );
        assert_eq!(world.get(player).unwrap().position_data, PositionData::default());
    }
}
