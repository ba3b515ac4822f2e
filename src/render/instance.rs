use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use catmode::assets::AnimationClip;
use catmode::effects::Explosion;
use catmode::particles::Particle;
use catmode::sim::CatView;

/// Shape ids understood by the sprite shader.
pub const SHAPE_CAT: u32 = 0;
pub const SHAPE_CAT_FADING: u32 = 1;
pub const SHAPE_EXPLOSION: u32 = 2;
pub const SHAPE_CONFETTI: u32 = 3;

/// Explosion burst diameter in pixels.
const EXPLOSION_SIZE: f32 = 180.0;

/// Per-instance data uploaded to GPU each frame.
/// Stride = 28 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Screen position of the center (x, y).
    pub position: [f32; 2],
    /// Width and height in pixels. Negative width mirrors the sprite.
    pub size: [f32; 2],
    /// RGBA color packed as u32.
    pub color: u32,
    /// One of the `SHAPE_*` ids.
    pub shape: u32,
    /// Shape-specific: dance phase, explosion progress or confetti rotation.
    pub param: f32,
}

impl SpriteInstance {
    /// A cat, interpolated between its last two motion ticks.
    pub fn cat(cat: &CatView, alpha: f32, dance: &AnimationClip) -> Self {
        let interp = Vec2::lerp(cat.prev_pos, cat.pos, alpha);
        // Face the way we are walking.
        let facing = if cat.heading.step().0 < 0 { -1.0 } else { 1.0 };
        let frame = dance.frame_at(cat.dance.elapsed);

        Self {
            position: interp.into(),
            size: [cat.size * facing, cat.size],
            color: cat.color,
            shape: if cat.colliding { SHAPE_CAT_FADING } else { SHAPE_CAT },
            param: frame as f32 / dance.frame_count() as f32,
        }
    }

    pub fn explosion(explosion: &Explosion, now: f64) -> Self {
        Self {
            position: explosion.pos.into(),
            size: [EXPLOSION_SIZE, EXPLOSION_SIZE],
            color: 0xFFB030FF,
            shape: SHAPE_EXPLOSION,
            param: explosion.progress(now),
        }
    }

    pub fn confetti(particle: &Particle) -> Self {
        let alpha = (particle.alpha() * 255.0) as u32;
        Self {
            position: particle.pos.into(),
            size: [particle.size, particle.size * 0.6],
            color: (particle.color & 0xFFFFFF00) | alpha.min(255),
            shape: SHAPE_CONFETTI,
            param: particle.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_vertex_layout() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 28);
    }
}
