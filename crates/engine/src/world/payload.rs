use super::inventory::Inventory;

pub const NPC_TYPE_MAX_LEN: usize = 31;
pub const GENERIC_TALKER_DIALOGUE: &str = "hello";
pub const DEFAULT_CHEST_ITEM: &str = "gold_coin";
pub const ROSTER_CHEST_ITEM: &str = "mysterious_gem";

const ORC_HIT_POINTS: i32 = 20;
const SHOP_HIT_POINTS: i32 = 100;
const GENERIC_HIT_POINTS: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Npc {
    npc_type: String,
    pub hit_points: i32,
    pub aggressive: bool,
    pub dialogue: Option<String>,
    pub inventory: Inventory,
}

impl Npc {
    pub fn new(
        npc_type: &str,
        hit_points: i32,
        aggressive: bool,
        dialogue: Option<String>,
        inventory: Inventory,
    ) -> Self {
        Self {
            npc_type: truncate_type_tag(npc_type),
            hit_points,
            aggressive,
            dialogue,
            inventory,
        }
    }

    pub fn orc() -> Self {
        Self::new(
            "orc",
            ORC_HIT_POINTS,
            true,
            Some("grrrr orc says hello".to_string()),
            Inventory::with_items(["orc_tooth"]),
        )
    }

    pub fn shop() -> Self {
        Self::new(
            "shop",
            SHOP_HIT_POINTS,
            false,
            Some("welcome, buy stuff".to_string()),
            Inventory::with_items(["potion", "bread"]),
        )
    }

    /// Passive NPC for roster types without a dedicated archetype.
    pub fn generic_talker(npc_type: &str, dialogue: Option<&str>) -> Self {
        Self::new(
            npc_type,
            GENERIC_HIT_POINTS,
            false,
            Some(dialogue.unwrap_or(GENERIC_TALKER_DIALOGUE).to_string()),
            Inventory::new(),
        )
    }

    pub fn npc_type(&self) -> &str {
        &self.npc_type
    }

    pub fn is_dead(&self) -> bool {
        self.hit_points <= 0
    }

    pub fn with_dialogue(mut self, dialogue: impl Into<String>) -> Self {
        self.dialogue = Some(dialogue.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chest {
    opened: bool,
    pub inventory: Inventory,
}

impl Chest {
    pub fn with_item(item: &str) -> Self {
        Self {
            opened: false,
            inventory: Inventory::with_items([item]),
        }
    }

    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            opened: false,
            inventory,
        }
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Opens the chest and drains its contents. Returns `None` when it was already open.
    pub fn open(&mut self) -> Option<Vec<String>> {
        if self.opened {
            return None;
        }
        self.opened = true;
        Some(self.inventory.take_all())
    }
}

/// Kind-specific data owned by an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    None,
    Npc(Npc),
    Chest(Chest),
}

impl Payload {
    pub fn as_npc(&self) -> Option<&Npc> {
        match self {
            Self::Npc(npc) => Some(npc),
            _ => None,
        }
    }

    pub fn as_npc_mut(&mut self) -> Option<&mut Npc> {
        match self {
            Self::Npc(npc) => Some(npc),
            _ => None,
        }
    }

    pub fn as_chest(&self) -> Option<&Chest> {
        match self {
            Self::Chest(chest) => Some(chest),
            _ => None,
        }
    }

    pub fn as_chest_mut(&mut self) -> Option<&mut Chest> {
        match self {
            Self::Chest(chest) => Some(chest),
            _ => None,
        }
    }
}

fn truncate_type_tag(npc_type: &str) -> String {
    npc_type.chars().take(NPC_TYPE_MAX_LEN).collect()
}
