use crate::world::{Vec2, World};

use super::input::ActionStates;
use super::InputAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Input for one simulation step. Press counts cover every key press since the
/// previous step; each press appears in exactly one snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    interact_presses: u32,
    attack_presses: u32,
    list_inventory_presses: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        interact_presses: u32,
        attack_presses: u32,
        list_inventory_presses: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            interact_presses,
            attack_presses,
            list_inventory_presses,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_presses > 0
    }

    pub fn attack_pressed(&self) -> bool {
        self.attack_presses > 0
    }

    pub fn list_inventory_pressed(&self) -> bool {
        self.list_inventory_presses > 0
    }

    pub fn interact_presses(&self) -> u32 {
        self.interact_presses
    }

    pub fn attack_presses(&self) -> u32 {
        self.attack_presses
    }

    pub fn list_inventory_presses(&self) -> u32 {
        self.list_inventory_presses
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_interact_pressed(self, pressed: bool) -> Self {
        self.with_interact_presses(u32::from(pressed))
    }

    pub fn with_attack_pressed(self, pressed: bool) -> Self {
        self.with_attack_presses(u32::from(pressed))
    }

    pub fn with_list_inventory_pressed(self, pressed: bool) -> Self {
        self.with_list_inventory_presses(u32::from(pressed))
    }

    pub fn with_interact_presses(mut self, presses: u32) -> Self {
        self.interact_presses = presses;
        self
    }

    pub fn with_attack_presses(mut self, presses: u32) -> Self {
        self.attack_presses = presses;
        self
    }

    pub fn with_list_inventory_presses(mut self, presses: u32) -> Self {
        self.list_inventory_presses = presses;
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

/// World point shown at the centre of the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    /// Centres on `target`, then keeps the view inside the level on axes where
    /// the level is larger than the viewport. Smaller levels stay centred.
    pub fn follow(target: Vec2, viewport: (u32, u32), level_px: (f32, f32)) -> Self {
        Self {
            position: Vec2 {
                x: follow_axis(target.x, viewport.0 as f32, level_px.0),
                y: follow_axis(target.y, viewport.1 as f32, level_px.1),
            },
        }
    }
}

fn follow_axis(target: f32, view: f32, level: f32) -> f32 {
    let half = view / 2.0;
    if level <= view {
        return level / 2.0;
    }
    target.clamp(half, level - half)
}

pub trait Scene {
    fn load(&mut self, world: &mut World);
    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot, world: &mut World)
        -> SceneCommand;
    fn unload(&mut self, world: &mut World);
    fn debug_title(&self, _world: &World) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_builders_set_edges() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveRight, true)
            .with_attack_pressed(true);
        assert!(snapshot.is_down(InputAction::MoveRight));
        assert!(snapshot.attack_pressed());
        assert!(!snapshot.interact_pressed());
        assert!(!snapshot.quit_requested());
        assert_eq!(snapshot.attack_presses(), 1);

        let repeated = InputSnapshot::empty().with_interact_presses(2);
        assert!(repeated.interact_pressed());
        assert_eq!(repeated.interact_presses(), 2);
    }

    #[test]
    fn camera_clamps_inside_large_level() {
        let camera = Camera2D::follow(Vec2::new(10.0, 980.0), (200, 100), (1000.0, 1000.0));
        assert_eq!(camera.position, Vec2::new(100.0, 950.0));

        let inside = Camera2D::follow(Vec2::new(500.0, 900.0), (200, 100), (1000.0, 1000.0));
        assert_eq!(inside.position, Vec2::new(500.0, 900.0));
    }

    #[test]
    fn camera_centres_small_level() {
        let camera = Camera2D::follow(Vec2::new(10.0, 10.0), (800, 600), (640.0, 480.0));
        assert_eq!(camera.position, Vec2::new(320.0, 240.0));
    }
}
