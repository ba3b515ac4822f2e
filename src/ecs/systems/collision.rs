use glam::Vec2;

use crate::ecs::components::{CatId, Colliding};
use crate::spatial::{BoundsCache, Rect};
use crate::viewport::Viewport;

/// A detected pair waiting for its fade-out before removal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCollision {
    pub a: CatId,
    pub b: CatId,
    pub resolve_at: f64,
    /// Midpoint at detection time, used if both rectangles vanished since.
    pub midpoint: Vec2,
}

/// Find the first colliding pair among cats that are fully on screen.
///
/// Pairs are scanned in ascending id order `(i, j)` with `i < j`. Only the
/// first hit is returned; anything else colliding this pass waits for the
/// next one, so a cat touching two others is never consumed twice.
pub fn find_pair(
    bounds: &BoundsCache,
    viewport: &Viewport,
    mut eligible: impl FnMut(CatId) -> bool,
) -> Option<(CatId, CatId, Vec2)> {
    let candidates: Vec<(CatId, Rect)> = bounds
        .iter()
        .filter(|s| s.rect.fully_within(viewport) && eligible(s.id))
        .map(|s| (s.id, s.rect))
        .collect();

    for (i, (id_a, rect_a)) in candidates.iter().enumerate() {
        for (id_b, rect_b) in &candidates[i + 1..] {
            if rect_a.overlaps(rect_b) {
                return Some((*id_a, *id_b, (rect_a.center + rect_b.center) * 0.5));
            }
        }
    }
    None
}

/// Run one detection pass: mark the first colliding pair and queue it.
pub fn detect(
    world: &mut hecs::World,
    bounds: &BoundsCache,
    viewport: &Viewport,
    now: f64,
    fade: f64,
    pending: &mut Vec<PendingCollision>,
) -> Option<PendingCollision> {
    // Cats already fading out, and cats without a live entity, sit this one out.
    let mut live: Vec<(CatId, hecs::Entity, bool)> = world
        .query::<(&CatId, Option<&Colliding>)>()
        .iter()
        .map(|(entity, (id, colliding))| (*id, entity, colliding.is_some()))
        .collect();
    live.sort_by_key(|(id, _, _)| *id);

    let lookup = |id: CatId| live.binary_search_by_key(&id, |(i, _, _)| *i).ok().map(|i| live[i]);

    let (a, b, midpoint) = find_pair(bounds, viewport, |id| {
        matches!(lookup(id), Some((_, _, false)))
    })?;

    let resolve_at = now + fade;
    for id in [a, b] {
        if let Some((_, entity, _)) = lookup(id) {
            // Entity came from a live query above, insert cannot fail.
            let _ = world.insert_one(entity, Colliding { resolve_at });
        }
    }

    let collision = PendingCollision {
        a,
        b,
        resolve_at,
        midpoint,
    };
    pending.push(collision);
    Some(collision)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(rects: &[(u32, f32, f32, f32)]) -> BoundsCache {
        let mut bounds = BoundsCache::new(rects.len());
        for &(id, x, y, size) in rects {
            bounds.report(CatId(id), Rect::square(Vec2::new(x, y), size));
        }
        bounds
    }

    #[test]
    fn first_pair_in_id_order_wins() {
        let vp = Viewport::new(1000.0, 1000.0);
        // 2-3 overlap and 1-4 overlap; 1-4 comes first in (i, j) order.
        let bounds = cache(&[
            (3, 520.0, 500.0, 100.0),
            (2, 500.0, 500.0, 100.0),
            (4, 220.0, 200.0, 100.0),
            (1, 200.0, 200.0, 100.0),
        ]);
        let (a, b, mid) = find_pair(&bounds, &vp, |_| true).unwrap();
        assert_eq!((a, b), (CatId(1), CatId(4)));
        assert_eq!(mid, Vec2::new(210.0, 200.0));
    }

    #[test]
    fn off_screen_cats_never_collide() {
        let vp = Viewport::new(1000.0, 1000.0);
        let bounds = cache(&[(1, 30.0, 500.0, 100.0), (2, 40.0, 500.0, 100.0)]);
        assert!(find_pair(&bounds, &vp, |_| true).is_none());
    }

    #[test]
    fn ineligible_cats_are_skipped() {
        let vp = Viewport::new(1000.0, 1000.0);
        let bounds = cache(&[
            (1, 500.0, 500.0, 100.0),
            (2, 510.0, 500.0, 100.0),
            (3, 520.0, 500.0, 100.0),
        ]);
        let (a, b, _) = find_pair(&bounds, &vp, |id| id != CatId(1)).unwrap();
        assert_eq!((a, b), (CatId(2), CatId(3)));
    }

    #[test]
    fn detect_marks_exactly_one_pair() {
        let vp = Viewport::new(1000.0, 1000.0);
        let mut world = hecs::World::new();
        for id in 1..=3 {
            world.spawn((CatId(id),));
        }
        let bounds = cache(&[
            (1, 500.0, 500.0, 100.0),
            (2, 510.0, 500.0, 100.0),
            (3, 520.0, 500.0, 100.0),
        ]);
        let mut pending = Vec::new();

        let first = detect(&mut world, &bounds, &vp, 1.0, 0.2, &mut pending).unwrap();
        assert_eq!((first.a, first.b), (CatId(1), CatId(2)));
        assert!((first.resolve_at - 1.2).abs() < 1e-9);
        assert_eq!(world.query::<&Colliding>().iter().count(), 2);

        // Cat 3 has nobody left to collide with.
        assert!(detect(&mut world, &bounds, &vp, 1.1, 0.2, &mut pending).is_none());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn cats_missing_from_the_cache_are_skipped() {
        let vp = Viewport::new(1000.0, 1000.0);
        let mut world = hecs::World::new();
        world.spawn((CatId(1),));
        world.spawn((CatId(2),));
        let bounds = cache(&[(1, 500.0, 500.0, 100.0)]);
        let mut pending = Vec::new();
        assert!(detect(&mut world, &bounds, &vp, 0.0, 0.2, &mut pending).is_none());
    }
}
