use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::world::{KindMask, World};

use super::input::{ActionStates, PressEdge};
use super::metrics::MetricsAccumulator;
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneCommand};

pub const DEFAULT_MAX_STEP: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Upper bound on the delta handed to a single simulation step.
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub asset_root: PathBuf,
    pub lighting: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Topdown".to_string(),
            window_width: 800,
            window_height: 600,
            max_frame_delta: DEFAULT_MAX_STEP,
            metrics_log_interval: Duration::from_secs(1),
            asset_root: PathBuf::from("assets"),
            lighting: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `scene` over `world` until quit: one input snapshot,
/// one clamped simulation step and one render per redraw.
pub fn run_app(config: LoopConfig, mut scene: Box<dyn Scene>, mut world: World) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), config.asset_root.clone(), config.lighting)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta = normalize_non_zero_duration(config.max_frame_delta, DEFAULT_MAX_STEP);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));

    scene.load(&mut world);
    info!(
        entity_count = world.pool.len(),
        npc_count = world.pool.count_kind(KindMask::NPC),
        cols = world.grid.cols(),
        rows = world.grid.rows(),
        "scene_loaded"
    );
    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        lighting = config.lighting,
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut last_frame_instant = Instant::now();
    let mut metrics = MetricsAccumulator::new(metrics_log_interval, last_frame_instant);
    let mut last_applied_title: Option<String> = None;
    let mut scene_unloaded = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let step = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    let input = input_collector.snapshot_for_frame();
                    let command = scene.update(step.as_secs_f32(), &input, &mut world);
                    if command == SceneCommand::Quit || input.quit_requested() {
                        info!(reason = "scene_quit", "shutdown_requested");
                        window_target.exit();
                    }

                    if let Err(error) = renderer.render_world(&world) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }

                    let next_title = scene.debug_title(&world);
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }

                    metrics.record_frame(raw_frame_dt, raw_frame_dt > max_frame_delta);
                    if let Some(snapshot) = metrics.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            slowest_frame_ms = snapshot.slowest_frame_ms,
                            clamped_frames = snapshot.clamped_frames,
                            entity_count = world.pool.len(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                if !scene_unloaded {
                    scene.unload(&mut world);
                    scene_unloaded = true;
                }
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    interact: PressEdge,
    attack: PressEdge,
    list_inventory: PressEdge,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.handle_physical_key(key_event.physical_key, is_pressed);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(action) = action_for_key(code) else {
            return;
        };
        self.action_states.set(action, is_pressed);
        match action {
            InputAction::Interact => self.interact.handle(is_pressed),
            InputAction::Attack => self.attack.handle(is_pressed),
            InputAction::ListInventory => self.list_inventory.handle(is_pressed),
            InputAction::Quit if is_pressed => self.mark_quit_requested(),
            _ => {}
        }
    }

    /// Press counts are consumed here, so each press reaches exactly one step.
    fn snapshot_for_frame(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.interact.take(),
            self.attack.take(),
            self.list_inventory.take(),
        )
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyE => Some(InputAction::Interact),
        KeyCode::Space => Some(InputAction::Attack),
        KeyCode::KeyI => Some(InputAction::ListInventory),
        KeyCode::Escape => Some(InputAction::Quit),
        _ => None,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputCollector, code: KeyCode) {
        input.handle_physical_key(PhysicalKey::Code(code), true);
    }

    fn release(input: &mut InputCollector, code: KeyCode) {
        input.handle_physical_key(PhysicalKey::Code(code), false);
    }

    #[test]
    fn clamp_frame_delta_caps_long_frames() {
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), DEFAULT_MAX_STEP),
            DEFAULT_MAX_STEP
        );
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(16), DEFAULT_MAX_STEP),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, DEFAULT_MAX_STEP),
            DEFAULT_MAX_STEP
        );
    }

    #[test]
    fn interact_press_reaches_one_frame() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyE);
        let first = input.snapshot_for_frame();
        press(&mut input, KeyCode::KeyE);
        let second = input.snapshot_for_frame();
        release(&mut input, KeyCode::KeyE);
        press(&mut input, KeyCode::KeyE);
        let third = input.snapshot_for_frame();
        assert!(first.interact_pressed());
        assert!(!second.interact_pressed());
        assert!(third.interact_pressed());
    }

    #[test]
    fn two_presses_before_one_redraw_are_both_delivered() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::Space);
        release(&mut input, KeyCode::Space);
        press(&mut input, KeyCode::Space);
        let first = input.snapshot_for_frame();
        let second = input.snapshot_for_frame();
        assert_eq!(first.attack_presses(), 2);
        assert_eq!(second.attack_presses(), 0);
    }

    #[test]
    fn attack_and_inventory_keys_produce_edges() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::Space);
        press(&mut input, KeyCode::KeyI);
        let snapshot = input.snapshot_for_frame();
        assert!(snapshot.attack_pressed());
        assert!(snapshot.list_inventory_pressed());
        assert!(!snapshot.interact_pressed());
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_movement() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::ArrowLeft);
        let snapshot = input.snapshot_for_frame();
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveDown));
    }

    #[test]
    fn key_release_clears_movement() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyD);
        release(&mut input, KeyCode::KeyD);
        assert!(!input.snapshot_for_frame().is_down(InputAction::MoveRight));
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::Escape);
        assert!(input.snapshot_for_frame().quit_requested());
    }
}
