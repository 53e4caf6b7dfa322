mod geometry;
mod inventory;
mod level;
mod loader;
mod payload;
mod pool;
mod spatial;
mod spawn;

use tracing::warn;

pub use geometry::{rect_center, Size, Vec2};
pub use inventory::{Inventory, INVENTORY_CAPACITY};
pub use level::{
    LevelConfig, LevelGrid, LevelGridError, TileCode, DEFAULT_MAX_COLS, DEFAULT_MAX_ROWS,
    DEFAULT_TILE_SIZE, TILE_CHEST_SPAWN, TILE_FLOOR, TILE_LAMP, TILE_WALL, TILE_WATER,
};
pub use loader::{
    apply_roster, builtin_default_source, load_level_file, load_roster_file, parse_level,
    LevelLoad, LoadError, RosterReport,
};
pub use payload::{
    Chest, Npc, Payload, DEFAULT_CHEST_ITEM, GENERIC_TALKER_DIALOGUE, NPC_TYPE_MAX_LEN,
    ROSTER_CHEST_ITEM,
};
pub use pool::{
    Entity, EntityId, EntityIdAllocator, EntityKind, EntityPool, KindMask, DEFAULT_POOL_CAPACITY,
};
pub use spatial::find_nearest;
pub use spawn::{
    actor_origin_in_cell, spawn_chest, spawn_light, spawn_npc, ACTOR_INSET, ACTOR_SIZE,
    LIGHT_RADIUS,
};

/// Everything the simulation mutates: the entity pool, the level, the player's
/// inventory and the accumulated clock.
#[derive(Debug)]
pub struct World {
    pub pool: EntityPool,
    pub grid: LevelGrid,
    pub player_inventory: Inventory,
    player_id: Option<EntityId>,
    elapsed_seconds: f32,
}

impl World {
    pub fn new(pool: EntityPool, grid: LevelGrid) -> Self {
        Self {
            pool,
            grid,
            player_inventory: Inventory::new(),
            player_id: None,
            elapsed_seconds: 0.0,
        }
    }

    /// Spawns the single player entity. A second call returns the existing id.
    pub fn spawn_player(&mut self, position: Vec2) -> Option<EntityId> {
        if let Some(id) = self.player_id.filter(|id| self.pool.contains(*id)) {
            warn!(entity_id = id.0, "player_already_spawned");
            return Some(id);
        }
        let id = spawn::spawn_player(&mut self.pool, position)?;
        self.player_id = Some(id);
        Some(id)
    }

    /// Centre of the level in pixels, offset so an actor placed there is centred.
    pub fn level_center_spawn(&self) -> Vec2 {
        Vec2 {
            x: self.grid.pixel_width() / 2.0 - ACTOR_SIZE.width as f32 / 2.0,
            y: self.grid.pixel_height() / 2.0 - ACTOR_SIZE.height as f32 / 2.0,
        }
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.pool.get(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let id = self.player_id?;
        self.pool.get_mut(id)
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn advance_clock(&mut self, dt_seconds: f32) {
        self.elapsed_seconds += dt_seconds;
    }
}
