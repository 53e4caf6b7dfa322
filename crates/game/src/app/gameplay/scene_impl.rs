struct GameplayScene {
    tuning: GameplayTuning,
    systems_host: GameplaySystemsHost,
    events: GameplayEventBus,
}

impl GameplayScene {
    fn new(tuning: GameplayTuning) -> Self {
        Self {
            tuning,
            systems_host: GameplaySystemsHost::default(),
            events: GameplayEventBus::default(),
        }
    }

    fn spawn_sample_npcs(&self, world: &mut World) {
        if !self.tuning.spawn_sample_npcs || world.pool.count_kind(KindMask::NPC) > 0 {
            return;
        }
        let Some(anchor) = world.player().map(|player| player.position) else {
            return;
        };
        let samples = [
            (Npc::shop(), SAMPLE_SHOP_OFFSET),
            (Npc::orc(), SAMPLE_ORC_OFFSET),
        ];
        for (npc, offset) in samples {
            let position = Vec2::new(anchor.x + offset.x, anchor.y + offset.y);
            let npc_type = npc.npc_type().to_string();
            match spawn_npc(&mut world.pool, npc, position) {
                Some(id) => info!(entity_id = id.0, npc_type = %npc_type, "sample_npc_spawned"),
                None => warn!(npc_type = %npc_type, "sample_npc_spawn_failed"),
            }
        }
    }
}

impl Scene for GameplayScene {
    fn load(&mut self, world: &mut World) {
        self.events.clear_current_frame();
        self.systems_host = GameplaySystemsHost::default();
        if world.player().is_none() {
            let spawn = world.level_center_spawn();
            if world.spawn_player(spawn).is_none() {
                warn!("player_spawn_failed");
            }
        }
        self.spawn_sample_npcs(world);
        info!(
            entity_count = world.pool.len(),
            capacity = world.pool.capacity(),
            sys = GAMEPLAY_SYSTEM_ORDER_TEXT,
            "gameplay_scene_loaded"
        );
    }

    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot, world: &mut World) -> SceneCommand {
        let dt_seconds = clamp_step(dt_seconds, self.tuning.max_step_seconds);
        world.advance_clock(dt_seconds);
        self.events.clear_current_frame();
        self.systems_host
            .run_once_per_frame(dt_seconds, input, &self.tuning, world, &mut self.events);
        for event in self.events.iter_emitted_so_far() {
            log_gameplay_event(event);
        }

        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut World) {
        info!(
            entity_count = world.pool.len(),
            items_carried = world.player_inventory.len(),
            events_emitted = self.events.total_emitted(),
            "gameplay_scene_unloaded"
        );
        self.events.clear_current_frame();
    }

    fn debug_title(&self, world: &World) -> Option<String> {
        Some(format!(
            "entities: {}/{} | items: {}",
            world.pool.len(),
            world.pool.capacity(),
            world.player_inventory.len()
        ))
    }
}

fn log_gameplay_event(event: &GameplayEvent) {
    match event {
        GameplayEvent::NothingToInteract => {
            info!(text = "Nothing nearby to interact with", "interact_no_target");
        }
        GameplayEvent::Taunt { npc_id, npc_type } => info!(
            npc_id = npc_id.0,
            text = %format!("The {npc_type} growls angrily."),
            "npc_taunt"
        ),
        GameplayEvent::Dialogue {
            npc_id,
            npc_type,
            text,
            wares,
        } => info!(
            npc_id = npc_id.0,
            npc_type = %npc_type,
            wares = ?wares,
            text = %format!("NPC says: {}", text.as_deref().unwrap_or(SILENT_DIALOGUE)),
            "npc_dialogue"
        ),
        GameplayEvent::ChestAlreadyOpened { chest_id } => info!(
            chest_id = chest_id.0,
            text = "Chest already opened.",
            "chest_already_opened"
        ),
        GameplayEvent::ChestEmpty { chest_id } => {
            info!(chest_id = chest_id.0, text = "Chest is empty.", "chest_empty");
        }
        GameplayEvent::ChestLooted {
            chest_id,
            items,
            discarded,
        } => {
            for item in items {
                info!(
                    chest_id = chest_id.0,
                    text = %format!("Picked up {item}"),
                    "item_picked_up"
                );
            }
            if !discarded.is_empty() {
                warn!(chest_id = chest_id.0, discarded = ?discarded, "inventory_full_loot_discarded");
            }
        }
        GameplayEvent::NothingToFight => info!("attack_no_target"),
        GameplayEvent::WontFightBack { npc_id, npc_type } => info!(
            npc_id = npc_id.0,
            npc_type = %npc_type,
            text = "That one won't fight back",
            "attack_passive_npc"
        ),
        GameplayEvent::NpcHit {
            npc_id,
            npc_type,
            damage,
            remaining_hit_points,
        } => info!(
            npc_id = npc_id.0,
            damage,
            text = %format!("Hit {npc_type}, hp now {remaining_hit_points}"),
            "npc_hit"
        ),
        GameplayEvent::NpcKilled {
            npc_id,
            npc_type,
            loot_chest,
            lost_loot,
        } => {
            info!(
                npc_id = npc_id.0,
                loot_chest = ?loot_chest.map(|id| id.0),
                text = %format!("{npc_type} dies"),
                "npc_killed"
            );
            if !lost_loot.is_empty() {
                warn!(npc_id = npc_id.0, lost_loot = ?lost_loot, "loot_chest_spawn_failed");
            }
        }
        GameplayEvent::InventoryListed { items } => {
            info!(count = items.len(), items = ?items, "inventory_listed");
        }
    }
}
