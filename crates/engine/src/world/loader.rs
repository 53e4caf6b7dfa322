use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::geometry::Vec2;
use super::level::{LevelConfig, LevelGrid, LevelGridError, TileCode, TILE_FLOOR, TILE_WALL};
use super::payload::{Chest, Npc, DEFAULT_CHEST_ITEM, ROSTER_CHEST_ITEM};
use super::pool::EntityPool;
use super::spawn::{actor_origin_in_cell, spawn_chest, spawn_light, spawn_npc};

const BUILTIN_COLS: usize = 20;
const BUILTIN_ROWS: usize = 15;
const BUILTIN_LAMPS: [(usize, usize); 2] = [(5, 5), (10, 8)];
const GENERIC_MARKER_TYPE: &str = "villager";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("level source has no tile rows")]
    Empty,
    #[error("invalid tile token {token:?} at line {line}, column {column}")]
    InvalidToken {
        line: usize,
        column: usize,
        token: String,
    },
    #[error(transparent)]
    Grid(#[from] LevelGridError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    PlayerSpawn,
    Light,
    Chest,
    Orc,
    Shop,
    Talker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelToken {
    Tile(TileCode),
    Marker { marker: Marker, floor: TileCode },
}

#[derive(Debug)]
pub struct LevelLoad {
    pub grid: LevelGrid,
    /// Top-left of the player's cell plus the actor inset; the player itself is not spawned.
    pub player_spawn: Option<Vec2>,
    pub spawned: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterReport {
    pub spawned: usize,
    pub skipped: usize,
    pub dropped: usize,
}

pub fn load_level_file(
    path: &Path,
    config: &LevelConfig,
    pool: &mut EntityPool,
) -> Result<LevelLoad, LoadError> {
    let source = read_source(path)?;
    parse_level(&source, config, pool)
}

pub fn load_roster_file(
    path: &Path,
    grid: &LevelGrid,
    pool: &mut EntityPool,
) -> Result<RosterReport, LoadError> {
    let source = read_source(path)?;
    Ok(apply_roster(&source, grid, pool))
}

/// Parses tile text into a grid and spawns every marker into `pool`.
///
/// The whole source is validated before anything is spawned, so an error leaves
/// the pool untouched.
pub fn parse_level(
    source: &str,
    config: &LevelConfig,
    pool: &mut EntityPool,
) -> Result<LevelLoad, LoadError> {
    let data_rows: Vec<(usize, Vec<&str>)> = source
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| (index + 1, split_tokens(line)))
        .take(config.max_rows)
        .collect();

    let cols = data_rows
        .first()
        .map(|(_, tokens)| tokens.len().min(config.max_cols))
        .unwrap_or(0);
    if cols == 0 {
        return Err(LoadError::Empty);
    }
    let rows = data_rows.len();

    let mut tiles = Vec::with_capacity(cols * rows);
    let mut markers = Vec::new();
    for (row, (line, tokens)) in data_rows.iter().enumerate() {
        for col in 0..cols {
            let Some(raw) = tokens.get(col) else {
                tiles.push(TILE_FLOOR);
                continue;
            };
            match parse_token(raw) {
                Some(LevelToken::Tile(code)) => tiles.push(code),
                Some(LevelToken::Marker { marker, floor }) => {
                    tiles.push(floor);
                    markers.push((marker, col, row));
                }
                None => {
                    return Err(LoadError::InvalidToken {
                        line: *line,
                        column: col + 1,
                        token: (*raw).to_string(),
                    })
                }
            }
        }
    }

    let grid = LevelGrid::new(cols, rows, config.tile_size, tiles, &config.blocking_tiles)?;

    let mut player_spawn = None;
    let mut spawned = 0;
    let mut dropped = 0;
    for (marker, col, row) in markers {
        let origin = actor_origin_in_cell(col, row, grid.tile_size());
        let result = match marker {
            Marker::PlayerSpawn => {
                if player_spawn.is_some() {
                    warn!(col, row, "duplicate_player_spawn_ignored");
                } else {
                    player_spawn = Some(origin);
                }
                continue;
            }
            Marker::Light => {
                let half = grid.tile_size() as f32 / 2.0;
                let cell = grid.cell_origin(col, row);
                spawn_light(pool, Vec2::new(cell.x + half, cell.y + half))
            }
            Marker::Chest => spawn_chest(pool, Chest::with_item(DEFAULT_CHEST_ITEM), origin),
            Marker::Orc => spawn_npc(pool, Npc::orc(), origin),
            Marker::Shop => spawn_npc(pool, Npc::shop(), origin),
            Marker::Talker => spawn_npc(pool, Npc::generic_talker(GENERIC_MARKER_TYPE, None), origin),
        };
        match result {
            Some(_) => spawned += 1,
            None => dropped += 1,
        }
    }

    info!(
        cols = grid.cols(),
        rows = grid.rows(),
        spawned,
        dropped,
        has_player_spawn = player_spawn.is_some(),
        "level_parsed"
    );
    Ok(LevelLoad {
        grid,
        player_spawn,
        spawned,
        dropped,
    })
}

/// Level text used when no level file is available: a walled room with two lamps.
pub fn builtin_default_source() -> String {
    let mut source = String::from("# built-in level\n");
    for row in 0..BUILTIN_ROWS {
        let line: Vec<String> = (0..BUILTIN_COLS)
            .map(|col| {
                let border =
                    row == 0 || col == 0 || row == BUILTIN_ROWS - 1 || col == BUILTIN_COLS - 1;
                if border {
                    TILE_WALL.to_string()
                } else if BUILTIN_LAMPS.contains(&(col, row)) {
                    "L".to_string()
                } else {
                    TILE_FLOOR.to_string()
                }
            })
            .collect();
        source.push_str(&line.join(","));
        source.push('\n');
    }
    source
}

/// Spawns NPCs and chests from `type,col,row[,text]` lines.
///
/// Malformed lines and cells outside `grid` are skipped with a warning; the
/// remaining lines still apply.
pub fn apply_roster(source: &str, grid: &LevelGrid, pool: &mut EntityPool) -> RosterReport {
    let mut report = RosterReport::default();
    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_number = index + 1;
        let entry = parse_roster_line(trimmed)
            .filter(|entry| entry.col < grid.cols() && entry.row < grid.rows());
        let Some(entry) = entry else {
            warn!(line = line_number, content = trimmed, "roster_line_skipped");
            report.skipped += 1;
            continue;
        };

        let origin = actor_origin_in_cell(entry.col, entry.row, grid.tile_size());
        let result = match entry.entity_type {
            "chest" => spawn_chest(
                pool,
                Chest::with_item(entry.text.unwrap_or(ROSTER_CHEST_ITEM)),
                origin,
            ),
            "orc" => spawn_npc(pool, with_override(Npc::orc(), entry.text), origin),
            "shop" => spawn_npc(pool, with_override(Npc::shop(), entry.text), origin),
            other => spawn_npc(pool, Npc::generic_talker(other, entry.text), origin),
        };
        match result {
            Some(_) => report.spawned += 1,
            None => report.dropped += 1,
        }
    }
    info!(
        spawned = report.spawned,
        skipped = report.skipped,
        dropped = report.dropped,
        "roster_applied"
    );
    report
}

struct RosterEntry<'a> {
    entity_type: &'a str,
    col: usize,
    row: usize,
    text: Option<&'a str>,
}

fn parse_roster_line(line: &str) -> Option<RosterEntry<'_>> {
    let mut fields = line.splitn(4, ',').map(str::trim);
    let entity_type = fields.next().filter(|field| !field.is_empty())?;
    let col = fields.next()?.parse().ok()?;
    let row = fields.next()?.parse().ok()?;
    let text = fields.next().filter(|field| !field.is_empty());
    Some(RosterEntry {
        entity_type,
        col,
        row,
        text,
    })
}

fn with_override(npc: Npc, dialogue: Option<&str>) -> Npc {
    match dialogue {
        Some(text) => npc.with_dialogue(text),
        None => npc,
    }
}

fn split_tokens(line: &str) -> Vec<&str> {
    line.split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect()
}

fn parse_token(token: &str) -> Option<LevelToken> {
    if let Some(code) = parse_code(token) {
        return Some(match code {
            2 => LevelToken::Marker {
                marker: Marker::Light,
                floor: TILE_FLOOR,
            },
            3 => LevelToken::Marker {
                marker: Marker::Chest,
                floor: TILE_FLOOR,
            },
            code => LevelToken::Tile(code),
        });
    }

    let (letter, floor) = match token.split_once('(') {
        Some((letter, rest)) => (letter, parse_code(rest.strip_suffix(')')?)?),
        None => (token, TILE_FLOOR),
    };
    let marker = match letter {
        "P" => Marker::PlayerSpawn,
        "L" => Marker::Light,
        "C" => Marker::Chest,
        "O" => Marker::Orc,
        "S" => Marker::Shop,
        "N" => Marker::Talker,
        _ => return None,
    };
    Some(LevelToken::Marker { marker, floor })
}

fn parse_code(token: &str) -> Option<TileCode> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::pool::{EntityKind, KindMask};
    use crate::world::geometry::Size;
    use crate::world::level::{TILE_LAMP, TILE_WATER};
    use std::io::Write;

    fn open_grid(cols: usize, rows: usize) -> LevelGrid {
        LevelGrid::new(cols, rows, 32, vec![TILE_FLOOR; cols * rows], &[TILE_WALL]).expect("grid")
    }

    fn parse(source: &str) -> (LevelLoad, EntityPool) {
        let mut pool = EntityPool::default();
        let load = parse_level(source, &LevelConfig::default(), &mut pool).expect("level");
        (load, pool)
    }

    #[test]
    fn numeric_rows_with_mixed_delimiters() {
        let (load, pool) = parse("# header\n1,1 1\n\n1, 0 ,4\n1 1 1\n");
        assert_eq!((load.grid.cols(), load.grid.rows()), (3, 3));
        assert_eq!(load.grid.tile_at(2, 1), Some(TILE_WATER));
        assert!(load.grid.is_blocking_cell(2, 1));
        assert!(!load.grid.is_blocking_cell(1, 1));
        assert!(pool.is_empty());
        assert_eq!(load.player_spawn, None);
    }

    #[test]
    fn short_rows_pad_with_floor_and_long_rows_truncate() {
        let (load, _) = parse("1,1,1\n1\n1,1,1,1,1\n");
        assert_eq!(load.grid.cols(), 3);
        assert_eq!(load.grid.tile_at(1, 1), Some(TILE_FLOOR));
        assert_eq!(load.grid.tile_at(2, 1), Some(TILE_FLOOR));
        assert_eq!(load.grid.tile_at(2, 2), Some(TILE_WALL));
    }

    #[test]
    fn rows_and_cols_are_capped_by_config() {
        let config = LevelConfig {
            max_rows: 2,
            max_cols: 2,
            ..LevelConfig::default()
        };
        let mut pool = EntityPool::default();
        let load = parse_level("0 0 0\n0 0 0\n0 0 0\n", &config, &mut pool).expect("level");
        assert_eq!((load.grid.cols(), load.grid.rows()), (2, 2));
    }

    #[test]
    fn chest_marker_spawns_inset_chest_with_gold() {
        let (load, pool) = parse("1 1 1 1\n1 0 0 1\n1 0 0 1\n1 0 3 1\n1 1 1 1\n");
        assert_eq!(load.grid.tile_at(2, 3), Some(TILE_FLOOR));
        let chest = pool.iter_kind(KindMask::CHEST).next().expect("chest");
        assert_eq!(chest.position, Vec2::new(66.0, 98.0));
        assert_eq!(chest.size, Size::square(28));
        let payload = chest.payload.as_chest().expect("chest payload");
        assert!(!payload.is_opened());
        assert_eq!(payload.inventory.items(), ["gold_coin"]);
    }

    #[test]
    fn lamp_marker_spawns_centered_light_and_clears_cell() {
        let (load, pool) = parse("0 0\n0 2\n");
        assert_ne!(load.grid.tile_at(1, 1), Some(TILE_LAMP));
        let light = pool.iter_kind(KindMask::LIGHT).next().expect("light");
        assert_eq!(light.center(), Vec2::new(48.0, 48.0));
        assert!(!light.collidable);
    }

    #[test]
    fn letter_markers_keep_their_floor_suffix() {
        let (load, pool) = parse("P O(4) S N C\n");
        assert_eq!(load.player_spawn, Some(Vec2::new(2.0, 2.0)));
        assert_eq!(load.grid.tile_at(1, 0), Some(TILE_WATER));
        assert_eq!(load.spawned, 4);
        assert_eq!(pool.count_kind(KindMask::NPC), 3);
        assert_eq!(pool.count_kind(KindMask::CHEST), 1);
        assert_eq!(pool.count_kind(KindMask::PLAYER), 0);
        let orc = pool
            .iter_kind(KindMask::NPC)
            .find_map(|entity| entity.payload.as_npc().filter(|npc| npc.aggressive))
            .expect("orc");
        assert_eq!(orc.npc_type(), "orc");
    }

    #[test]
    fn unknown_token_reports_line_and_column_without_spawning() {
        let mut pool = EntityPool::default();
        let result = parse_level("# c\n3 0\n0 X\n", &LevelConfig::default(), &mut pool);
        match result {
            Err(LoadError::InvalidToken {
                line,
                column,
                token,
            }) => {
                assert_eq!((line, column), (3, 2));
                assert_eq!(token, "X");
            }
            other => panic!("expected invalid token, got {other:?}"),
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn empty_source_is_an_error() {
        let mut pool = EntityPool::default();
        let result = parse_level("# nothing\n\n", &LevelConfig::default(), &mut pool);
        assert!(matches!(result, Err(LoadError::Empty)));
    }

    #[test]
    fn markers_past_pool_capacity_are_counted_as_dropped() {
        let mut pool = EntityPool::with_capacity(1);
        let load = parse_level("C C C\n", &LevelConfig::default(), &mut pool).expect("level");
        assert_eq!(load.spawned, 1);
        assert_eq!(load.dropped, 2);
    }

    #[test]
    fn builtin_level_has_wall_border_and_two_lamps() {
        let (load, pool) = parse(&builtin_default_source());
        assert_eq!((load.grid.cols(), load.grid.rows()), (20, 15));
        assert!(load.grid.is_blocking_cell(0, 7));
        assert!(load.grid.is_blocking_cell(19, 14));
        assert!(!load.grid.is_blocking_cell(5, 5));
        assert_eq!(pool.count_kind(KindMask::LIGHT), 2);
    }

    #[test]
    fn roster_spawns_known_and_generic_types() {
        let mut pool = EntityPool::default();
        let report = apply_roster(
            "# roster\norc,3,4\nshop,5,5,fresh bread\nchest,1,1\nchest,2,1,ruby\nfarmer,6,6\n",
            &open_grid(10, 10),
            &mut pool,
        );
        assert_eq!(report.spawned, 5);
        assert_eq!(report.skipped, 0);

        let shop = pool
            .iter_kind(KindMask::NPC)
            .filter_map(|entity| entity.payload.as_npc())
            .find(|npc| npc.npc_type() == "shop")
            .expect("shop");
        assert_eq!(shop.dialogue.as_deref(), Some("fresh bread"));

        let chest_items: Vec<&str> = pool
            .iter_kind(KindMask::CHEST)
            .filter_map(|entity| entity.payload.as_chest())
            .flat_map(|chest| chest.inventory.items().iter().map(String::as_str))
            .collect();
        assert_eq!(chest_items, ["mysterious_gem", "ruby"]);

        let farmer = pool
            .iter()
            .find(|entity| {
                entity
                    .payload
                    .as_npc()
                    .is_some_and(|npc| npc.npc_type() == "farmer")
            })
            .expect("farmer");
        assert_eq!(farmer.kind, EntityKind::Npc);
        assert_eq!(farmer.position, Vec2::new(194.0, 194.0));
    }

    #[test]
    fn malformed_roster_lines_are_skipped() {
        let mut pool = EntityPool::default();
        let report = apply_roster(
            "orc,1\norc,x,2\n,1,1\norc,-1,2\nshop,1,1\n",
            &open_grid(10, 10),
            &mut pool,
        );
        assert_eq!(report.skipped, 4);
        assert_eq!(report.spawned, 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn roster_cells_outside_the_grid_are_skipped() {
        let mut pool = EntityPool::default();
        let report = apply_roster(
            "orc,500,500\nchest,4,0\nshop,0,3\norc,3,2\n",
            &open_grid(4, 3),
            &mut pool,
        );
        assert_eq!(report.skipped, 3);
        assert_eq!(report.spawned, 1);
        let orc = pool.iter().next().expect("orc");
        assert_eq!(orc.position, Vec2::new(98.0, 66.0));
    }

    #[test]
    fn level_and_roster_files_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let level_path = dir.path().join("level.map");
        let roster_path = dir.path().join("level.npc");
        let mut level = fs::File::create(&level_path).expect("create level");
        writeln!(level, "1 1 1\n1 P 1\n1 1 1").expect("write level");
        fs::write(&roster_path, "orc,1,1\n").expect("write roster");

        let mut pool = EntityPool::default();
        let load = load_level_file(&level_path, &LevelConfig::default(), &mut pool).expect("level");
        assert_eq!(load.player_spawn, Some(Vec2::new(34.0, 34.0)));
        let report = load_roster_file(&roster_path, &load.grid, &mut pool).expect("roster");
        assert_eq!(report.spawned, 1);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut pool = EntityPool::default();
        let result = load_level_file(
            &dir.path().join("absent.map"),
            &LevelConfig::default(),
            &mut pool,
        );
        assert!(matches!(result, Err(LoadError::Read { .. })));
    }
}
