use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{LevelConfig, LoopConfig};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_FILE_NAME: &str = "topdown.json";
const MAX_STEP_SECONDS_LIMIT: f32 = 1.0;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path} at {json_path}: {message}")]
    Parse {
        path: PathBuf,
        json_path: String,
        message: String,
    },
    #[error("invalid config {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window: WindowConfig,
    pub(crate) level: LevelConfig,
    pub(crate) pool_capacity: usize,
    pub(crate) gameplay: GameplayTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            level: LevelConfig::default(),
            pool_capacity: engine::world::DEFAULT_POOL_CAPACITY,
            gameplay: GameplayTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) lighting: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Topdown".to_string(),
            width: 800,
            height: 600,
            lighting: true,
        }
    }
}

/// Speeds are pixels per second, radii and margins are pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameplayTuning {
    pub(crate) player_speed: f32,
    pub(crate) max_step_seconds: f32,
    pub(crate) bounds_margin: f32,
    pub(crate) interact_radius: f32,
    pub(crate) attack_radius: f32,
    pub(crate) attack_damage: i32,
    pub(crate) aggro_radius: f32,
    pub(crate) chase_speed: f32,
    pub(crate) chase_min_distance: f32,
    pub(crate) wander_amplitude: f32,
    pub(crate) wander_speed: f32,
    pub(crate) spawn_sample_npcs: bool,
}

impl Default for GameplayTuning {
    fn default() -> Self {
        Self {
            player_speed: 120.0,
            max_step_seconds: 0.05,
            bounds_margin: 2.0,
            interact_radius: 48.0,
            attack_radius: 48.0,
            attack_damage: 8,
            aggro_radius: 300.0,
            chase_speed: 50.0,
            chase_min_distance: 1.0,
            wander_amplitude: 0.5,
            wander_speed: 8.0,
            spawn_sample_npcs: true,
        }
    }
}

impl GameConfig {
    pub(crate) fn loop_config(&self, asset_root: PathBuf) -> LoopConfig {
        let defaults = LoopConfig::default();
        let max_frame_delta = Duration::try_from_secs_f32(self.gameplay.max_step_seconds)
            .unwrap_or(defaults.max_frame_delta);
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            max_frame_delta,
            asset_root,
            lighting: self.window.lighting,
            ..defaults
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.level.tile_size == 0 {
            return Err("level.tile_size must be non-zero".to_string());
        }
        if self.level.max_rows == 0 || self.level.max_cols == 0 {
            return Err("level.max_rows and level.max_cols must be non-zero".to_string());
        }
        if self.pool_capacity == 0 {
            return Err("pool_capacity must be non-zero".to_string());
        }
        let step = self.gameplay.max_step_seconds;
        if !(step.is_finite() && step > 0.0) {
            return Err("gameplay.max_step_seconds must be a positive number".to_string());
        }
        if step > MAX_STEP_SECONDS_LIMIT {
            return Err(format!(
                "gameplay.max_step_seconds must be at most {MAX_STEP_SECONDS_LIMIT}"
            ));
        }
        Ok(())
    }
}

/// Reads `explicit` when given; otherwise `topdown.json` under `root` if it exists,
/// else defaults.
pub(crate) fn load_config(explicit: Option<&Path>, root: &Path) -> Result<GameConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = root.join(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                return Ok(GameConfig::default());
            }
            candidate
        }
    };
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&raw, &path)
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: GameConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                json_path,
                message: error.into_inner().to_string(),
            }
        })?;
    config.validate().map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(config)
}
