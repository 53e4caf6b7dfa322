use crate::app::Camera2D;
use crate::world::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World and screen both grow downward on y; the camera position lands on the viewport centre.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let x = world.x - camera.position.x + viewport.width as f32 * 0.5;
    let y = world.y - camera.position.y + viewport.height as f32 * 0.5;
    (x.floor() as i32, y.floor() as i32)
}

pub fn screen_to_world(screen: (i32, i32), camera: &Camera2D, viewport: Viewport) -> Vec2 {
    Vec2 {
        x: screen.0 as f32 - viewport.width as f32 * 0.5 + camera.position.x,
        y: screen.1 as f32 - viewport.height as f32 * 0.5 + camera.position.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let camera = Camera2D {
            position: Vec2::new(320.0, 240.0),
        };
        assert_eq!(world_to_screen(Vec2::new(320.0, 240.0), &camera, VIEWPORT), (400, 300));
    }

    #[test]
    fn larger_world_y_is_lower_on_screen() {
        let camera = Camera2D::default();
        let (_, above) = world_to_screen(Vec2::new(0.0, 10.0), &camera, VIEWPORT);
        let (_, below) = world_to_screen(Vec2::new(0.0, 20.0), &camera, VIEWPORT);
        assert!(below > above);
    }

    #[test]
    fn screen_to_world_inverts_integer_points() {
        let camera = Camera2D {
            position: Vec2::new(50.0, 75.0),
        };
        let world = Vec2::new(12.0, 40.0);
        let screen = world_to_screen(world, &camera, VIEWPORT);
        assert_eq!(screen_to_world(screen, &camera, VIEWPORT), world);
    }
}
