use super::pool::{EntityId, EntityPool, KindMask};

/// Nearest live entity matching `mask` whose centre lies within `radius` of the
/// origin entity's centre. The origin itself is never returned.
///
/// Ties keep the entity in the lower slot.
pub fn find_nearest(
    pool: &EntityPool,
    origin: EntityId,
    radius: f32,
    mask: KindMask,
) -> Option<EntityId> {
    let center = pool.get(origin)?.center();
    let radius_sq = radius * radius;
    let mut best: Option<(EntityId, f32)> = None;
    for entity in pool.iter_kind(mask) {
        if entity.id == origin {
            continue;
        }
        let other = entity.center();
        let dx = other.x - center.x;
        let dy = other.y - center.y;
        let distance_sq = dx * dx + dy * dy;
        if distance_sq > radius_sq {
            continue;
        }
        if best.map_or(true, |(_, best_sq)| distance_sq < best_sq) {
            best = Some((entity.id, distance_sq));
        }
    }
    best.map(|(id, _)| id)
}
