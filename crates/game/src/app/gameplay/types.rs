#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplaySystemId {
    PlayerMovement,
    Interaction,
    Combat,
    InventoryReport,
    NpcAi,
}

impl GameplaySystemId {
    #[cfg(test)]
    fn name(self) -> &'static str {
        match self {
            Self::PlayerMovement => "PlayerMovement",
            Self::Interaction => "Interaction",
            Self::Combat => "Combat",
            Self::InventoryReport => "InventoryReport",
            Self::NpcAi => "NpcAi",
        }
    }
}

const GAMEPLAY_SYSTEM_ORDER: [GameplaySystemId; 5] = [
    GameplaySystemId::PlayerMovement,
    GameplaySystemId::Interaction,
    GameplaySystemId::Combat,
    GameplaySystemId::InventoryReport,
    GameplaySystemId::NpcAi,
];

/// Outcome of a player action, emitted once per resolved press.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GameplayEvent {
    NothingToInteract,
    Taunt {
        npc_id: EntityId,
        npc_type: String,
    },
    Dialogue {
        npc_id: EntityId,
        npc_type: String,
        text: Option<String>,
        wares: Vec<String>,
    },
    ChestAlreadyOpened {
        chest_id: EntityId,
    },
    ChestEmpty {
        chest_id: EntityId,
    },
    ChestLooted {
        chest_id: EntityId,
        items: Vec<String>,
        /// Items that did not fit in the player's inventory.
        discarded: Vec<String>,
    },
    NothingToFight,
    WontFightBack {
        npc_id: EntityId,
        npc_type: String,
    },
    NpcHit {
        npc_id: EntityId,
        npc_type: String,
        damage: i32,
        remaining_hit_points: i32,
    },
    NpcKilled {
        npc_id: EntityId,
        npc_type: String,
        loot_chest: Option<EntityId>,
        /// Loot lost because no chest could be spawned.
        lost_loot: Vec<String>,
    },
    InventoryListed {
        items: Vec<String>,
    },
}

#[derive(Debug, Default)]
struct GameplayEventBus {
    current_frame_events: Vec<GameplayEvent>,
    total_emitted: u64,
}

impl GameplayEventBus {
    fn clear_current_frame(&mut self) {
        self.current_frame_events.clear();
    }

    fn emit(&mut self, event: GameplayEvent) {
        self.total_emitted = self.total_emitted.saturating_add(1);
        self.current_frame_events.push(event);
    }

    fn iter_emitted_so_far(&self) -> impl Iterator<Item = &GameplayEvent> {
        self.current_frame_events.iter()
    }

    fn total_emitted(&self) -> u64 {
        self.total_emitted
    }
}
