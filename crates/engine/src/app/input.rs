#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    Attack,
    ListInventory,
    Quit,
}

const ACTION_COUNT: usize = 8;

/// Held state per action, as last reported by the window.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Counts key-down transitions so every physical press is resolved once, even when
/// several land between two steps.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PressEdge {
    is_down: bool,
    presses: u32,
}

impl PressEdge {
    pub(crate) fn handle(&mut self, is_pressed: bool) {
        if is_pressed && !self.is_down {
            self.presses = self.presses.saturating_add(1);
        }
        self.is_down = is_pressed;
    }

    pub(crate) fn take(&mut self) -> u32 {
        std::mem::take(&mut self.presses)
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::Attack => 5,
            InputAction::ListInventory => 6,
            InputAction::Quit => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_key_produces_one_edge() {
        let mut edge = PressEdge::default();
        edge.handle(true);
        edge.handle(true);
        assert_eq!(edge.take(), 1);
        edge.handle(true);
        assert_eq!(edge.take(), 0);
        edge.handle(false);
        edge.handle(true);
        assert_eq!(edge.take(), 1);
    }

    #[test]
    fn presses_between_takes_are_counted() {
        let mut edge = PressEdge::default();
        edge.handle(true);
        edge.handle(false);
        edge.handle(true);
        edge.handle(false);
        edge.handle(true);
        assert_eq!(edge.take(), 3);
        assert_eq!(edge.take(), 0);
    }

    #[test]
    fn action_states_track_each_action_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::Attack, true);
        states.set(InputAction::MoveLeft, true);
        states.set(InputAction::MoveLeft, false);
        assert!(states.is_down(InputAction::Attack));
        assert!(!states.is_down(InputAction::MoveLeft));
    }
}
