use glam::Vec2;

use crate::ecs::components::CatId;
use crate::viewport::Viewport;

/// Axis-aligned screen rectangle, stored as center + full size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn square(center: Vec2, side: f32) -> Self {
        Self {
            center,
            size: Vec2::splat(side),
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// AABB overlap on both axes (touching edges do not count).
    pub fn overlaps(&self, other: &Rect) -> bool {
        let d = (self.center - other.center).abs();
        let reach = (self.size + other.size) * 0.5;
        d.x < reach.x && d.y < reach.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let (lo, hi) = (self.min(), self.max());
        point.x >= lo.x && point.x <= hi.x && point.y >= lo.y && point.y <= hi.y
    }

    /// Entire rectangle lies within the viewport.
    pub fn fully_within(&self, viewport: &Viewport) -> bool {
        let (lo, hi) = (self.min(), self.max());
        lo.x >= 0.0 && lo.y >= 0.0 && hi.x <= viewport.width && hi.y <= viewport.height
    }
}

/// Last reported on-screen rectangle of one cat.
#[derive(Debug, Clone, Copy)]
pub struct BoundsSnapshot {
    pub id: CatId,
    pub rect: Rect,
}

/// Authoritative position store.
///
/// The motion system reports every cat's rectangle after moving it; the
/// collision pass and click hit-testing read from here only. A cat that has
/// not been through a motion tick yet has no entry and is simply invisible
/// to both readers for that cycle. Kept sorted by id so pair scans have a
/// fixed order.
pub struct BoundsCache {
    entries: Vec<BoundsSnapshot>,
}

impl BoundsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace the rectangle for `id`.
    pub fn report(&mut self, id: CatId, rect: Rect) {
        match self.entries.binary_search_by_key(&id, |e| e.id) {
            Ok(i) => self.entries[i].rect = rect,
            Err(i) => self.entries.insert(i, BoundsSnapshot { id, rect }),
        }
    }

    pub fn get(&self, id: CatId) -> Option<Rect> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| self.entries[i].rect)
    }

    pub fn remove(&mut self, id: CatId) {
        if let Ok(i) = self.entries.binary_search_by_key(&id, |e| e.id) {
            self.entries.remove(i);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshots in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundsSnapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Topmost (most recently spawned) cat under `point`.
    pub fn hit(&self, point: Vec2) -> Option<CatId> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.rect.contains(point))
            .map(|e| e.id)
    }
}
