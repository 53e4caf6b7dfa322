use super::geometry::{Size, Vec2};
use super::payload::{Chest, Npc, Payload};
use super::pool::{EntityId, EntityKind, EntityPool};

/// Actors sit `ACTOR_INSET` pixels inside the top-left corner of their cell.
pub const ACTOR_INSET: f32 = 2.0;
pub const ACTOR_SIZE: Size = Size::square(28);
pub const LIGHT_RADIUS: u32 = 80;

/// Top-left position of an actor standing in cell `(col, row)`.
pub fn actor_origin_in_cell(col: usize, row: usize, tile_size: u32) -> Vec2 {
    Vec2 {
        x: (col as u64 * tile_size as u64) as f32 + ACTOR_INSET,
        y: (row as u64 * tile_size as u64) as f32 + ACTOR_INSET,
    }
}

pub fn spawn_player(pool: &mut EntityPool, position: Vec2) -> Option<EntityId> {
    let id = pool.spawn(EntityKind::Player, position, ACTOR_SIZE, Payload::None)?;
    set_visual(pool, id, "player");
    Some(id)
}

pub fn spawn_npc(pool: &mut EntityPool, npc: Npc, position: Vec2) -> Option<EntityId> {
    let visual = archetype_visual(npc.npc_type());
    let id = pool.spawn(EntityKind::Npc, position, ACTOR_SIZE, Payload::Npc(npc))?;
    if let Some(key) = visual {
        set_visual(pool, id, key);
    }
    Some(id)
}

pub fn spawn_chest(pool: &mut EntityPool, chest: Chest, position: Vec2) -> Option<EntityId> {
    pool.spawn(EntityKind::Chest, position, ACTOR_SIZE, Payload::Chest(chest))
}

/// A light is stored as a square whose half-extent is its radius.
pub fn spawn_light(pool: &mut EntityPool, center: Vec2) -> Option<EntityId> {
    let radius = LIGHT_RADIUS as f32;
    pool.spawn(
        EntityKind::Light,
        Vec2 {
            x: center.x - radius,
            y: center.y - radius,
        },
        Size::square(LIGHT_RADIUS * 2),
        Payload::None,
    )
}

fn archetype_visual(npc_type: &str) -> Option<&'static str> {
    match npc_type {
        "orc" => Some("npc/orc"),
        "shop" => Some("npc/shop"),
        _ => None,
    }
}

fn set_visual(pool: &mut EntityPool, id: EntityId, key: &str) {
    if let Some(entity) = pool.get_mut(id) {
        entity.visual = Some(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_origin_applies_inset() {
        assert_eq!(actor_origin_in_cell(2, 3, 32), Vec2::new(66.0, 98.0));
    }

    #[test]
    fn light_is_centered_on_requested_point() {
        let mut pool = EntityPool::with_capacity(1);
        let id = spawn_light(&mut pool, Vec2::new(176.0, 176.0)).expect("room");
        let light = pool.get(id).expect("live");
        assert_eq!(light.center(), Vec2::new(176.0, 176.0));
        assert_eq!(light.size, Size::square(160));
    }

    #[test]
    fn archetype_npcs_get_sprite_keys() {
        let mut pool = EntityPool::with_capacity(2);
        let orc = spawn_npc(&mut pool, Npc::orc(), Vec2::ZERO).expect("room");
        let farmer = spawn_npc(&mut pool, Npc::generic_talker("farmer", None), Vec2::ZERO)
            .expect("room");
        assert_eq!(pool.get(orc).and_then(|e| e.visual.as_deref()), Some("npc/orc"));
        assert_eq!(pool.get(farmer).and_then(|e| e.visual.as_deref()), None);
    }
}
