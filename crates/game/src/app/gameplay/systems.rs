struct GameplaySystemContext<'a> {
    dt_seconds: f32,
    input: &'a InputSnapshot,
    tuning: &'a GameplayTuning,
    world: &'a mut World,
    events: &'a mut GameplayEventBus,
}

#[derive(Default)]
struct GameplaySystemsHost {
    last_frame_order: Vec<GameplaySystemId>,
}

impl GameplaySystemsHost {
    fn run_once_per_frame(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        tuning: &GameplayTuning,
        world: &mut World,
        events: &mut GameplayEventBus,
    ) {
        self.last_frame_order.clear();
        let mut context = GameplaySystemContext {
            dt_seconds,
            input,
            tuning,
            world,
            events,
        };
        for system_id in GAMEPLAY_SYSTEM_ORDER {
            self.last_frame_order.push(system_id);
            match system_id {
                GameplaySystemId::PlayerMovement => player_movement_system(&mut context),
                GameplaySystemId::Interaction => interaction_system(&mut context),
                GameplaySystemId::Combat => combat_system(&mut context),
                GameplaySystemId::InventoryReport => inventory_report_system(&mut context),
                GameplaySystemId::NpcAi => npc_ai_system(&mut context),
            }
        }
    }
}

fn player_movement_system(context: &mut GameplaySystemContext<'_>) {
    let Some((position, size)) = context
        .world
        .player()
        .map(|player| (player.position, player.size))
    else {
        return;
    };
    let delta = movement_delta(context.input, context.dt_seconds, context.tuning.player_speed);
    let grid = &context.world.grid;
    let moved = grid.resolve_move(position, size, delta);
    let clamped = grid.clamp_to_bounds(moved, size, context.tuning.bounds_margin);
    if let Some(player) = context.world.player_mut() {
        player.position = clamped;
    }
}

fn interaction_system(context: &mut GameplaySystemContext<'_>) {
    for _ in 0..context.input.interact_presses() {
        resolve_interaction(context);
    }
}

fn resolve_interaction(context: &mut GameplaySystemContext<'_>) {
    let Some(player_id) = context.world.player_id() else {
        return;
    };
    let target_id = find_nearest(
        &context.world.pool,
        player_id,
        context.tuning.interact_radius,
        KindMask::NPC | KindMask::CHEST,
    );
    let Some(target) = target_id.and_then(|id| context.world.pool.get_mut(id)) else {
        context.events.emit(GameplayEvent::NothingToInteract);
        return;
    };
    let target_id = target.id;

    let looted = match &mut target.payload {
        Payload::Npc(npc) if npc.aggressive => {
            context.events.emit(GameplayEvent::Taunt {
                npc_id: target_id,
                npc_type: npc.npc_type().to_string(),
            });
            return;
        }
        Payload::Npc(npc) => {
            context.events.emit(GameplayEvent::Dialogue {
                npc_id: target_id,
                npc_type: npc.npc_type().to_string(),
                text: npc.dialogue.clone(),
                wares: npc.inventory.items().to_vec(),
            });
            return;
        }
        Payload::Chest(chest) => chest.open(),
        Payload::None => {
            context.events.emit(GameplayEvent::NothingToInteract);
            return;
        }
    };

    let event = match looted {
        None => GameplayEvent::ChestAlreadyOpened {
            chest_id: target_id,
        },
        Some(items) if items.is_empty() => GameplayEvent::ChestEmpty {
            chest_id: target_id,
        },
        Some(items) => {
            let mut taken = Vec::with_capacity(items.len());
            let mut discarded = Vec::new();
            for item in items {
                match context.world.player_inventory.add(item.clone()) {
                    Ok(()) => taken.push(item),
                    Err(rejected) => discarded.push(rejected),
                }
            }
            GameplayEvent::ChestLooted {
                chest_id: target_id,
                items: taken,
                discarded,
            }
        }
    };
    context.events.emit(event);
}

fn combat_system(context: &mut GameplaySystemContext<'_>) {
    for _ in 0..context.input.attack_presses() {
        resolve_attack(context);
    }
}

fn resolve_attack(context: &mut GameplaySystemContext<'_>) {
    let Some(player_id) = context.world.player_id() else {
        return;
    };
    let target_id = find_nearest(
        &context.world.pool,
        player_id,
        context.tuning.attack_radius,
        KindMask::NPC,
    );
    let Some(target) = target_id.and_then(|id| context.world.pool.get_mut(id)) else {
        context.events.emit(GameplayEvent::NothingToFight);
        return;
    };
    let npc_id = target.id;
    let Some(npc) = target.payload.as_npc_mut() else {
        context.events.emit(GameplayEvent::NothingToFight);
        return;
    };
    if !npc.aggressive {
        context.events.emit(GameplayEvent::WontFightBack {
            npc_id,
            npc_type: npc.npc_type().to_string(),
        });
        return;
    }

    let damage = context.tuning.attack_damage;
    npc.hit_points -= damage;
    context.events.emit(GameplayEvent::NpcHit {
        npc_id,
        npc_type: npc.npc_type().to_string(),
        damage,
        remaining_hit_points: npc.hit_points,
    });
    if !npc.is_dead() {
        return;
    }

    let Some(corpse) = context.world.pool.despawn(npc_id) else {
        return;
    };
    let last_position = corpse.position;
    let Payload::Npc(npc) = corpse.payload else {
        return;
    };
    let npc_type = npc.npc_type().to_string();
    let (loot_chest, lost_loot) = drop_loot(&mut context.world.pool, npc.inventory, last_position);
    context.events.emit(GameplayEvent::NpcKilled {
        npc_id,
        npc_type,
        loot_chest,
        lost_loot,
    });
}

/// Moves `inventory` into a new chest at `position`. Without a free slot the
/// items are handed back as lost.
fn drop_loot(
    pool: &mut EntityPool,
    mut inventory: Inventory,
    position: Vec2,
) -> (Option<EntityId>, Vec<String>) {
    if inventory.is_empty() {
        return (None, Vec::new());
    }
    if pool.is_full() {
        return (None, inventory.take_all());
    }
    (
        spawn_chest(pool, Chest::with_inventory(inventory), position),
        Vec::new(),
    )
}

fn inventory_report_system(context: &mut GameplaySystemContext<'_>) {
    for _ in 0..context.input.list_inventory_presses() {
        context.events.emit(GameplayEvent::InventoryListed {
            items: context.world.player_inventory.items().to_vec(),
        });
    }
}

fn npc_ai_system(context: &mut GameplaySystemContext<'_>) {
    let Some(player_center) = context.world.player().map(Entity::center) else {
        return;
    };
    let clock = context.world.elapsed_seconds();
    let tuning = context.tuning;
    let aggro_radius_sq = tuning.aggro_radius * tuning.aggro_radius;
    for entity in context.world.pool.iter_mut() {
        if entity.kind != EntityKind::Npc {
            continue;
        }
        let is_aggressive = entity.payload.as_npc().is_some_and(|npc| npc.aggressive);
        if !is_aggressive {
            continue;
        }
        let center = entity.center();
        let to_player = Vec2::new(player_center.x - center.x, player_center.y - center.y);
        if to_player.length_sq() < aggro_radius_sq {
            entity.position = chase_step(
                entity.position,
                to_player,
                tuning.chase_speed,
                context.dt_seconds,
                tuning.chase_min_distance,
            );
        } else {
            entity.position.x += wander_offset(
                clock,
                entity.id,
                tuning.wander_amplitude,
                tuning.wander_speed,
                context.dt_seconds,
            );
        }
    }
}
