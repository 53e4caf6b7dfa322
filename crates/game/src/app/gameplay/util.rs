/// Screen-space movement: up is negative y.
fn movement_delta(input: &InputSnapshot, dt_seconds: f32, speed: f32) -> Vec2 {
    let mut x = 0.0f32;
    let mut y = 0.0f32;

    if input.is_down(InputAction::MoveRight) {
        x += 1.0;
    }
    if input.is_down(InputAction::MoveLeft) {
        x -= 1.0;
    }
    if input.is_down(InputAction::MoveUp) {
        y -= 1.0;
    }
    if input.is_down(InputAction::MoveDown) {
        y += 1.0;
    }

    let len_sq = x * x + y * y;
    if len_sq > 0.0 {
        let inv_len = len_sq.sqrt().recip();
        x *= inv_len;
        y *= inv_len;
    }

    Vec2 {
        x: x * speed * dt_seconds,
        y: y * speed * dt_seconds,
    }
}

/// Moves `position` along `offset` at `speed`. Offsets shorter than
/// `min_distance` leave the position untouched.
fn chase_step(position: Vec2, offset: Vec2, speed: f32, dt_seconds: f32, min_distance: f32) -> Vec2 {
    let distance_sq = offset.length_sq();
    if distance_sq <= min_distance * min_distance || distance_sq == 0.0 {
        return position;
    }
    let inv_distance = distance_sq.sqrt().recip();
    let step = speed * dt_seconds;
    Vec2 {
        x: position.x + offset.x * inv_distance * step,
        y: position.y + offset.y * inv_distance * step,
    }
}

/// Horizontal drift for idle aggressive NPCs; the id decorrelates neighbours.
fn wander_offset(clock: f32, id: EntityId, amplitude: f32, speed: f32, dt_seconds: f32) -> f32 {
    (clock + id.0 as f32).sin() * amplitude * dt_seconds * speed
}

fn clamp_step(dt_seconds: f32, max_step_seconds: f32) -> f32 {
    if dt_seconds.is_nan() || dt_seconds <= 0.0 {
        return 0.0;
    }
    dt_seconds.min(max_step_seconds)
}
