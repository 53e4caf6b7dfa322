use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod world;

pub use app::{
    run_app, screen_to_world, world_to_screen, AppError, Camera2D, InputAction, InputSnapshot,
    LoopConfig, LoopMetricsSnapshot, Renderer, Scene, SceneCommand, Viewport, DEFAULT_MAX_STEP,
};
pub use world::{
    find_nearest, Chest, Entity, EntityId, EntityKind, EntityPool, Inventory, KindMask,
    LevelConfig, LevelGrid, LoadError, Npc, Payload, RosterReport, Size, Vec2, World,
};

pub const ROOT_ENV_VAR: &str = "TOPDOWN_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            levels_dir: root.join("levels"),
            assets_dir: root.join("assets"),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{var} is set but does not point to a game root: {path}\n\
A game root contains a levels/ directory or a Cargo.toml next to crates/."
    )]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error(
        "could not find a game root above {start_dir}\n\
Expected a directory containing levels/ or Cargo.toml next to crates/.\n\
Set {env_var} explicitly, for example: export {env_var}=\"/path/to/topdown\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_root_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    var: ROOT_ENV_VAR,
                    path: normalized,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_root_marker(candidate))
        .map(normalize_path)
}

fn is_root_marker(path: &Path) -> bool {
    let has_levels = path.join("levels").is_dir();
    let is_workspace = path.join("Cargo.toml").is_file() && path.join("crates").is_dir();
    has_levels || is_workspace
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
