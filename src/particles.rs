use glam::Vec2;

use crate::viewport::Viewport;

/// Maximum concurrent confetti pieces.
const MAX_PARTICLES: usize = 600;
/// Pieces emitted per second across the top edge.
const EMIT_RATE: f32 = 90.0;
/// Downward acceleration in pixels/second².
const GRAVITY: f32 = 220.0;

/// A single confetti piece.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pub max_lifetime: f32,
    /// RGBA packed as u32.
    pub color: u32,
    /// Side length in pixels.
    pub size: f32,
    pub rotation: f32,
    pub spin: f32,
}

impl Particle {
    /// Opacity, easing out near the end of life.
    pub fn alpha(&self) -> f32 {
        let frac = (self.lifetime / self.max_lifetime).clamp(0.0, 1.0);
        frac.sqrt()
    }
}

/// Confetti rain shown while a celebration is running.
///
/// Has its own random source so that how much confetti falls never shifts
/// the cat parameters drawn from a seeded simulation.
pub struct Confetti {
    particles: Vec<Particle>,
    /// Fractional pieces carried over between updates.
    carry: f32,
    rng: fastrand::Rng,
}

impl Confetti {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            particles: Vec::with_capacity(MAX_PARTICLES),
            carry: 0.0,
            rng,
        }
    }

    /// Emit new pieces along the top edge for `dt` seconds of celebration.
    pub fn emit(&mut self, viewport: &Viewport, dt: f32) {
        const COLORS: [u32; 6] = [
            0xFF5C8AFF, // pink
            0xFFD23FFF, // yellow
            0x3BCEACFF, // teal
            0x540D6EFF, // purple
            0xEE4266FF, // red
            0x4D9DE0FF, // blue
        ];

        let rng = &mut self.rng;
        self.carry += EMIT_RATE * dt;
        while self.carry >= 1.0 {
            self.carry -= 1.0;
            if self.particles.len() >= MAX_PARTICLES {
                continue;
            }
            let lifetime = 2.5 + rng.f32() * 2.0;
            self.particles.push(Particle {
                pos: Vec2::new(rng.f32() * viewport.width, -10.0 - rng.f32() * 40.0),
                vel: Vec2::new(rng.f32() * 120.0 - 60.0, 40.0 + rng.f32() * 80.0),
                lifetime,
                max_lifetime: lifetime,
                color: COLORS[rng.usize(0..COLORS.len())],
                size: 6.0 + rng.f32() * 8.0,
                rotation: rng.f32() * std::f32::consts::TAU,
                spin: rng.f32() * 8.0 - 4.0,
            });
        }
    }

    /// Move, age and remove dead pieces.
    pub fn update(&mut self, dt: f32, viewport: &Viewport) {
        // Update in-place, swap-remove dead ones
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.vel.y += GRAVITY * dt;
            p.vel.x *= 1.0 - 0.8 * dt; // air drag
            p.pos += p.vel * dt;
            p.rotation += p.spin * dt;
            p.lifetime -= dt;

            if p.lifetime <= 0.0 || p.pos.y > viewport.height + 40.0 {
                self.particles.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.carry = 0.0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Number of active pieces.
    pub fn count(&self) -> usize {
        self.particles.len()
    }
}

impl Default for Confetti {
    fn default() -> Self {
        Self::new()
    }
}
