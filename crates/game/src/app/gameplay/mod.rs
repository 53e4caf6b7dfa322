use engine::world::{
    find_nearest, spawn_chest, spawn_npc, Chest, Entity, EntityId, EntityKind, EntityPool,
    Inventory, KindMask, Npc, Payload, Vec2, World,
};
use engine::{InputAction, InputSnapshot, Scene, SceneCommand};
use tracing::{info, warn};

use super::config::GameplayTuning;

const GAMEPLAY_SYSTEM_ORDER_TEXT: &str = "PlayerMovement>Interaction>Combat>InventoryReport>NpcAi";
const SAMPLE_SHOP_OFFSET: Vec2 = Vec2 { x: 60.0, y: 0.0 };
const SAMPLE_ORC_OFFSET: Vec2 = Vec2 { x: -80.0, y: -20.0 };
const SILENT_DIALOGUE: &str = "(silence)";

include!("types.rs");
include!("systems.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn build_scene(tuning: GameplayTuning) -> Box<dyn Scene> {
    Box::new(GameplayScene::new(tuning))
}
