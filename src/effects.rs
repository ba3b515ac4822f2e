use glam::Vec2;

/// A burst left behind where two cats collided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub id: u64,
    pub pos: Vec2,
    /// Simulation time the explosion appeared.
    pub created_at: f64,
    pub lifetime: f64,
}

impl Explosion {
    /// 0.0 when it appears, 1.0 when it is about to vanish.
    pub fn progress(&self, now: f64) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        ((now - self.created_at) / self.lifetime).clamp(0.0, 1.0) as f32
    }

    pub fn expired(&self, now: f64) -> bool {
        now - self.created_at >= self.lifetime
    }
}

/// Manages explosions on screen. Each one removes itself after its lifetime.
pub struct Explosions {
    pub explosions: Vec<Explosion>,
    next_id: u64,
    lifetime: f64,
}

impl Explosions {
    pub fn new(lifetime: f64) -> Self {
        Self {
            explosions: Vec::with_capacity(8),
            next_id: 0,
            lifetime,
        }
    }

    pub fn spawn(&mut self, pos: Vec2, now: f64) -> u64 {
        self.next_id += 1;
        self.explosions.push(Explosion {
            id: self.next_id,
            pos,
            created_at: now,
            lifetime: self.lifetime,
        });
        self.next_id
    }

    /// Drop explosions whose time is up. Returns how many were removed.
    pub fn update(&mut self, now: f64) -> usize {
        let before = self.explosions.len();
        self.explosions.retain(|e| !e.expired(now));
        before - self.explosions.len()
    }

    pub fn clear(&mut self) {
        self.explosions.clear();
    }

    pub fn len(&self) -> usize {
        self.explosions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.explosions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Explosion> {
        self.explosions.iter()
    }
}
