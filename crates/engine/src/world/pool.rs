use bitflags::bitflags;
use tracing::{debug, warn};

use super::geometry::{rect_center, Size, Vec2};
use super::payload::Payload;

pub const DEFAULT_POOL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Npc,
    Chest,
    Light,
}

impl EntityKind {
    pub fn mask(self) -> KindMask {
        match self {
            Self::Player => KindMask::PLAYER,
            Self::Npc => KindMask::NPC,
            Self::Chest => KindMask::CHEST,
            Self::Light => KindMask::LIGHT,
        }
    }

    pub fn is_collidable(self) -> bool {
        !matches!(self, Self::Light)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
            Self::Chest => "chest",
            Self::Light => "light",
        }
    }

    fn accepts(self, payload: &Payload) -> bool {
        matches!(
            (self, payload),
            (Self::Player | Self::Light, Payload::None)
                | (Self::Npc, Payload::Npc(_))
                | (Self::Chest, Payload::Chest(_))
        )
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindMask: u8 {
        const PLAYER = 1 << 0;
        const NPC = 1 << 1;
        const CHEST = 1 << 2;
        const LIGHT = 1 << 3;
    }
}

impl KindMask {
    pub fn matches(self, kind: EntityKind) -> bool {
        self.contains(kind.mask())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub size: Size,
    pub payload: Payload,
    pub collidable: bool,
    /// Sprite key drawn instead of the kind's placeholder, when present.
    pub visual: Option<String>,
}

impl Entity {
    pub fn center(&self) -> Vec2 {
        rect_center(self.position, self.size)
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        // Ids start at 1.
        self.next = self.next.saturating_add(1);
        EntityId(self.next)
    }
}

/// Fixed-capacity slot storage. A `None` slot is free for reuse; ids are never reissued.
#[derive(Debug)]
pub struct EntityPool {
    allocator: EntityIdAllocator,
    slots: Vec<Option<Entity>>,
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }
}

impl EntityPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Places a new entity in the first free slot.
    ///
    /// Returns `None` when the pool is full or `payload` does not belong to `kind`;
    /// the payload is dropped in that case.
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        size: Size,
        payload: Payload,
    ) -> Option<EntityId> {
        if !kind.accepts(&payload) {
            warn!(kind = kind.name(), "spawn_payload_kind_mismatch");
            return None;
        }
        let Some(index) = self.slots.iter().position(Option::is_none) else {
            warn!(
                kind = kind.name(),
                capacity = self.slots.len(),
                "spawn_dropped_pool_full"
            );
            return None;
        };
        let id = self.allocator.allocate();
        self.slots[index] = Some(Entity {
            id,
            kind,
            position,
            size,
            payload,
            collidable: kind.is_collidable(),
            visual: None,
        });
        debug!(entity_id = id.0, kind = kind.name(), "entity_spawned");
        Some(id)
    }

    /// Removes the entity and hands it back so its payload can be moved out.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|entity| entity.id == id))?;
        debug!(entity_id = id.0, "entity_despawned");
        self.slots[index].take()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.iter().find(|entity| entity.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.iter_mut().find(|entity| entity.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    pub fn iter_kind(&self, mask: KindMask) -> impl Iterator<Item = &Entity> {
        self.iter().filter(move |entity| mask.matches(entity.kind))
    }

    pub fn count_kind(&self, mask: KindMask) -> usize {
        self.iter_kind(mask).count()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
