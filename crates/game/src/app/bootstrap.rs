use std::path::{Path, PathBuf};

use clap::Parser;
use engine::world::{
    builtin_default_source, load_level_file, load_roster_file, parse_level, EntityPool, LevelGrid,
    LevelLoad, LoadError, World,
};
use engine::{resolve_app_paths, AppPaths, LevelConfig, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_config, ConfigError, GameConfig};
use super::gameplay;

const DEFAULT_LEVEL_FILE: &str = "level1.map";
const DEFAULT_ROSTER_FILE: &str = "level1.npc";

/// Top-down tile game.
#[derive(Debug, Parser)]
#[command(name = "topdown", version)]
pub(crate) struct Cli {
    /// Level file; defaults to levels/level1.map under the game root.
    pub(crate) map: Option<PathBuf>,
    /// NPC roster file; defaults to levels/level1.npc under the game root.
    pub(crate) roster: Option<PathBuf>,
    /// JSON config file; defaults to topdown.json under the game root when present.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("built-in level failed to load: {0}")]
    BuiltinLevel(#[source] LoadError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) world: World,
}

pub(crate) fn build_app(cli: Cli) -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Topdown Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "root_resolved");
    let config = load_config(cli.config.as_deref(), &paths.root)?;
    let world = build_world(&cli, &paths, &config)?;
    let scene = gameplay::build_scene(config.gameplay.clone());

    Ok(AppWiring {
        config: config.loop_config(paths.assets_dir.clone()),
        scene,
        world,
    })
}

fn build_world(cli: &Cli, paths: &AppPaths, config: &GameConfig) -> Result<World, BootstrapError> {
    let level_path = cli
        .map
        .clone()
        .unwrap_or_else(|| paths.levels_dir.join(DEFAULT_LEVEL_FILE));
    let roster_path = cli
        .roster
        .clone()
        .unwrap_or_else(|| paths.levels_dir.join(DEFAULT_ROSTER_FILE));

    let mut pool = EntityPool::with_capacity(config.pool_capacity);
    let load = match load_level_file(&level_path, &config.level, &mut pool) {
        Ok(load) => {
            info!(
                path = %level_path.display(),
                cols = load.grid.cols(),
                rows = load.grid.rows(),
                spawned = load.spawned,
                dropped = load.dropped,
                "level_loaded"
            );
            load
        }
        Err(error) => {
            warn!(
                path = %level_path.display(),
                error = %error,
                "level_load_failed_using_builtin"
            );
            load_builtin_level(&config.level, &mut pool)?
        }
    };
    let player_spawn = load.player_spawn;
    let mut world = World::new(pool, load.grid);

    apply_roster_file(&roster_path, &world.grid, &mut world.pool);

    let spawn = player_spawn.unwrap_or_else(|| world.level_center_spawn());
    match world.spawn_player(spawn) {
        Some(id) => info!(entity_id = id.0, x = spawn.x, y = spawn.y, "player_spawned"),
        None => warn!(capacity = world.pool.capacity(), "player_spawn_failed_pool_full"),
    }
    Ok(world)
}

fn load_builtin_level(
    config: &LevelConfig,
    pool: &mut EntityPool,
) -> Result<LevelLoad, BootstrapError> {
    parse_level(&builtin_default_source(), config, pool).map_err(BootstrapError::BuiltinLevel)
}

fn apply_roster_file(path: &Path, grid: &LevelGrid, pool: &mut EntityPool) {
    if !path.is_file() {
        info!(path = %path.display(), "roster_missing_skipped");
        return;
    }
    match load_roster_file(path, grid, pool) {
        Ok(report) => info!(
            path = %path.display(),
            spawned = report.spawned,
            skipped = report.skipped,
            dropped = report.dropped,
            "roster_loaded"
        ),
        Err(error) => warn!(path = %path.display(), error = %error, "roster_load_failed"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use engine::world::KindMask;

    use super::*;

    fn cli_for(map: PathBuf, roster: PathBuf) -> Cli {
        Cli {
            map: Some(map),
            roster: Some(roster),
            config: None,
        }
    }

    fn paths_in(dir: &Path) -> AppPaths {
        AppPaths::from_root(dir.to_path_buf())
    }

    #[test]
    fn cli_parses_positional_paths_and_config_flag() {
        let cli = Cli::try_parse_from(["topdown", "a.map", "b.npc", "--config", "c.json"])
            .expect("cli");
        assert_eq!(cli.map, Some(PathBuf::from("a.map")));
        assert_eq!(cli.roster, Some(PathBuf::from("b.npc")));
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));

        let bare = Cli::try_parse_from(["topdown"]).expect("cli");
        assert!(bare.map.is_none() && bare.roster.is_none() && bare.config.is_none());
    }

    #[test]
    fn level_and_roster_are_applied_before_player_spawn() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = dir.path().join("room.map");
        let roster = dir.path().join("room.npc");
        fs::write(&map, "1,1,1,1\n1,P,0,1\n1,0,0,1\n1,1,1,1\n").expect("map");
        fs::write(&roster, "# roster\norc,2,2\nchest,1,2,ruby\n").expect("roster");

        let world = build_world(
            &cli_for(map, roster),
            &paths_in(dir.path()),
            &GameConfig::default(),
        )
        .expect("world");
        assert_eq!(world.grid.cols(), 4);
        assert_eq!(world.pool.count_kind(KindMask::NPC), 1);
        assert_eq!(world.pool.count_kind(KindMask::CHEST), 1);
        let player = world.player().expect("player");
        assert_eq!(player.position, engine::Vec2::new(34.0, 34.0));
        let last_slot = world.pool.iter().last().map(|entity| entity.id);
        assert_eq!(last_slot, world.player_id());
    }

    #[test]
    fn missing_level_falls_back_to_builtin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let world = build_world(
            &cli_for(dir.path().join("absent.map"), dir.path().join("absent.npc")),
            &paths_in(dir.path()),
            &GameConfig::default(),
        )
        .expect("world");
        assert_eq!((world.grid.cols(), world.grid.rows()), (20, 15));
        assert_eq!(world.pool.count_kind(KindMask::LIGHT), 2);
        assert_eq!(
            world.player().map(|player| player.position),
            Some(world.level_center_spawn())
        );
    }

    #[test]
    fn malformed_level_falls_back_to_builtin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = dir.path().join("bad.map");
        fs::write(&map, "0 0 0\n0 ? 0\n").expect("map");
        let world = build_world(
            &cli_for(map, dir.path().join("absent.npc")),
            &paths_in(dir.path()),
            &GameConfig::default(),
        )
        .expect("world");
        assert_eq!((world.grid.cols(), world.grid.rows()), (20, 15));
    }

    #[test]
    fn default_paths_come_from_levels_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let levels = dir.path().join("levels");
        fs::create_dir(&levels).expect("levels");
        fs::write(levels.join(DEFAULT_LEVEL_FILE), "0 0 0\n0 S 0\n0 0 0\n").expect("map");
        let cli = Cli {
            map: None,
            roster: None,
            config: None,
        };
        let world = build_world(&cli, &paths_in(dir.path()), &GameConfig::default())
            .expect("world");
        assert_eq!(world.grid.cols(), 3);
        assert_eq!(world.pool.count_kind(KindMask::NPC), 1);
    }
}
