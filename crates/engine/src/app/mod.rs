mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, DEFAULT_MAX_STEP};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{screen_to_world, world_to_screen, Renderer, Viewport};
pub use scene::{Camera2D, InputSnapshot, Scene, SceneCommand};
