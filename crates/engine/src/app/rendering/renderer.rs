use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::Camera2D;
use crate::world::{
    Entity, EntityKind, LevelGrid, TileCode, Vec2, World, TILE_FLOOR, TILE_WALL, TILE_WATER,
};

use super::{world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [20, 20, 30, 255];
const FLOOR_COLOR: [u8; 4] = [34, 139, 34, 255];
const WALL_COLOR: [u8; 4] = [80, 80, 90, 255];
const WATER_COLOR: [u8; 4] = [40, 70, 140, 255];
const UNKNOWN_TILE_COLOR: [u8; 4] = [100, 140, 100, 255];
const PLAYER_COLOR: [u8; 4] = [200, 180, 50, 255];
const HOSTILE_NPC_COLOR: [u8; 4] = [180, 80, 80, 255];
const PASSIVE_NPC_COLOR: [u8; 4] = [90, 150, 190, 255];
const CHEST_CLOSED_COLOR: [u8; 4] = [170, 120, 60, 255];
const CHEST_OPENED_COLOR: [u8; 4] = [120, 120, 120, 255];
const LAMP_COLOR: [u8; 4] = [200, 200, 160, 255];
/// Darkness applied where no light reaches, out of 255.
const AMBIENT_DARKNESS: f32 = 200.0 / 255.0;

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileRange {
    col_min: usize,
    col_max: usize,
    row_min: usize,
    row_max: usize,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    lighting: bool,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_sprite_keys: HashSet<String>,
    darkness: Vec<f32>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf, lighting: bool) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            lighting,
            sprite_cache: HashMap::new(),
            warned_sprite_keys: HashSet::new(),
            darkness: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &World) -> Result<(), Error> {
        let viewport = self.viewport;
        if viewport.width == 0 || viewport.height == 0 {
            return Ok(());
        }

        let focus = world.player().map(Entity::center).unwrap_or(Vec2 {
            x: world.grid.pixel_width() / 2.0,
            y: world.grid.pixel_height() / 2.0,
        });
        let camera = Camera2D::follow(
            focus,
            (viewport.width, viewport.height),
            (world.grid.pixel_width(), world.grid.pixel_height()),
        );

        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned_sprite_keys = &mut self.warned_sprite_keys;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        draw_grid(frame, viewport, &camera, &world.grid);
        for entity in world.pool.iter() {
            if entity.kind == EntityKind::Light {
                continue;
            }
            let sprite = entity.visual.as_deref().and_then(|key| {
                resolve_cached_sprite(sprite_cache, warned_sprite_keys, asset_root, key)
            });
            draw_entity(frame, viewport, &camera, entity, sprite);
        }
        for light in world.pool.iter().filter(|e| e.kind == EntityKind::Light) {
            let (cx, cy) = world_to_screen(light.center(), &camera, viewport);
            let half = (world.grid.tile_size() / 4) as i32;
            fill_rect_clipped(frame, viewport, cx - half, cy - half, half * 2, half * 2, LAMP_COLOR);
        }

        if self.lighting {
            build_darkness(&mut self.darkness, viewport, &camera, world);
            apply_darkness(frame, &self.darkness);
        }

        self.pixels.render()
    }
}

fn draw_grid(frame: &mut [u8], viewport: Viewport, camera: &Camera2D, grid: &LevelGrid) {
    let Some(range) = visible_tile_range(grid, camera, viewport) else {
        return;
    };
    let tile = grid.tile_size() as i32;
    for row in range.row_min..=range.row_max {
        for col in range.col_min..=range.col_max {
            let Some(code) = grid.tile_at(col, row) else {
                continue;
            };
            let (x, y) = world_to_screen(grid.cell_origin(col, row), camera, viewport);
            fill_rect_clipped(frame, viewport, x, y, tile, tile, tile_color(code));
        }
    }
}

fn draw_entity(
    frame: &mut [u8],
    viewport: Viewport,
    camera: &Camera2D,
    entity: &Entity,
    sprite: Option<&LoadedSprite>,
) {
    let (x, y) = world_to_screen(entity.position, camera, viewport);
    let width = entity.size.width as i32;
    let height = entity.size.height as i32;
    match sprite {
        Some(sprite) => draw_sprite_fitted(frame, viewport, x, y, width, height, sprite),
        None => fill_rect_clipped(frame, viewport, x, y, width, height, entity_color(entity)),
    }
}

fn tile_color(code: TileCode) -> [u8; 4] {
    match code {
        TILE_FLOOR => FLOOR_COLOR,
        TILE_WALL => WALL_COLOR,
        TILE_WATER => WATER_COLOR,
        _ => UNKNOWN_TILE_COLOR,
    }
}

fn entity_color(entity: &Entity) -> [u8; 4] {
    match entity.kind {
        EntityKind::Player => PLAYER_COLOR,
        EntityKind::Npc => match entity.payload.as_npc() {
            Some(npc) if !npc.aggressive => PASSIVE_NPC_COLOR,
            _ => HOSTILE_NPC_COLOR,
        },
        EntityKind::Chest => match entity.payload.as_chest() {
            Some(chest) if chest.is_opened() => CHEST_OPENED_COLOR,
            _ => CHEST_CLOSED_COLOR,
        },
        EntityKind::Light => LAMP_COLOR,
    }
}

fn visible_tile_range(grid: &LevelGrid, camera: &Camera2D, viewport: Viewport) -> Option<TileRange> {
    let tile = grid.tile_size() as f32;
    let half_w = viewport.width as f32 / 2.0;
    let half_h = viewport.height as f32 / 2.0;
    let min_col = ((camera.position.x - half_w) / tile).floor().max(0.0) as usize;
    let min_row = ((camera.position.y - half_h) / tile).floor().max(0.0) as usize;
    let max_col_f = ((camera.position.x + half_w) / tile).floor();
    let max_row_f = ((camera.position.y + half_h) / tile).floor();
    if max_col_f < 0.0 || max_row_f < 0.0 {
        return None;
    }
    let max_col = (max_col_f as usize).min(grid.cols() - 1);
    let max_row = (max_row_f as usize).min(grid.rows() - 1);
    if min_col > max_col || min_row > max_row {
        return None;
    }
    Some(TileRange {
        col_min: min_col,
        col_max: max_col,
        row_min: min_row,
        row_max: max_row,
    })
}

/// Per-pixel darkness in `[0, AMBIENT_DARKNESS]`; each light thins it linearly toward its centre.
fn build_darkness(darkness: &mut Vec<f32>, viewport: Viewport, camera: &Camera2D, world: &World) {
    let width = viewport.width as i32;
    let height = viewport.height as i32;
    darkness.clear();
    darkness.resize((viewport.width * viewport.height) as usize, AMBIENT_DARKNESS);
    for light in world.pool.iter().filter(|e| e.kind == EntityKind::Light) {
        let radius = light.size.width as f32 / 2.0;
        if radius <= 0.0 {
            continue;
        }
        let (cx, cy) = world_to_screen(light.center(), camera, viewport);
        let reach = radius.ceil() as i32;
        for y in (cy - reach).max(0)..(cy + reach + 1).min(height) {
            for x in (cx - reach).max(0)..(cx + reach + 1).min(width) {
                let dx = (x - cx) as f32;
                let dy = (y - cy) as f32;
                let level = light_darkness((dx * dx + dy * dy).sqrt(), radius);
                let index = y as usize * viewport.width as usize + x as usize;
                if level < darkness[index] {
                    darkness[index] = level;
                }
            }
        }
    }
}

fn light_darkness(distance: f32, radius: f32) -> f32 {
    if distance >= radius {
        return AMBIENT_DARKNESS;
    }
    AMBIENT_DARKNESS * (distance / radius)
}

fn apply_darkness(frame: &mut [u8], darkness: &[f32]) {
    for (pixel, level) in frame.chunks_exact_mut(4).zip(darkness) {
        let keep = 1.0 - level;
        for channel in &mut pixel[..3] {
            *channel = (*channel as f32 * keep).round() as u8;
        }
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match sprite_path_for_key(asset_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(warned_sprite_keys, key, Some(&path), &reason);
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_sprite_keys, key, None, reason);
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

/// Keys are lowercase relative paths such as `npc/orc`.
fn sprite_path_for_key(asset_root: &Path, key: &str) -> Result<PathBuf, &'static str> {
    if key.is_empty() || key.starts_with('/') || key.contains("..") {
        return Err("invalid_key");
    }
    let allowed = key
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-'));
    if !allowed {
        return Err("invalid_key");
    }
    Ok(asset_root.join("sprites").join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason,
        "sprite_load_failed_using_color"
    );
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    if byte_offset + 4 > frame.len() {
        return;
    }
    frame[byte_offset..byte_offset + 4].copy_from_slice(&color);
}

fn fill_rect_clipped(
    frame: &mut [u8],
    viewport: Viewport,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    color: [u8; 4],
) {
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + width).min(viewport.width as i32);
    let bottom = (y + height).min(viewport.height as i32);
    for py in top..bottom {
        for px in left..right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, px, py, color);
        }
    }
}

/// Nearest-neighbour stretch of `sprite` onto the entity rectangle; transparent texels are skipped.
fn draw_sprite_fitted(
    frame: &mut [u8],
    viewport: Viewport,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    sprite: &LoadedSprite,
) {
    if sprite.width == 0 || sprite.height == 0 || width <= 0 || height <= 0 {
        return;
    }
    if sprite.rgba.len() < sprite.width as usize * sprite.height as usize * 4 {
        return;
    }
    for dy in 0..height {
        let src_y = (dy as u64 * sprite.height as u64 / height as u64) as usize;
        for dx in 0..width {
            let src_x = (dx as u64 * sprite.width as u64 / width as u64) as usize;
            let offset = (src_y * sprite.width as usize + src_x) * 4;
            let texel = [
                sprite.rgba[offset],
                sprite.rgba[offset + 1],
                sprite.rgba[offset + 2],
                sprite.rgba[offset + 3],
            ];
            if texel[3] == 0 {
                continue;
            }
            let px = x + dx;
            let py = y + dy;
            if px >= viewport.width as i32 || py >= viewport.height as i32 {
                continue;
            }
            write_pixel_rgba_clipped(frame, viewport.width as usize, px, py, texel);
        }
    }
}
