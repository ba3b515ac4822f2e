pub mod animation;

use glam::Vec2;

use crate::config::SimConfig;
use crate::ecs::components::*;
use crate::viewport::Viewport;
use animation::AnimationState;

/// Everything needed to put one cat into the world.
#[derive(Debug, Clone, Copy)]
pub struct CatSpec {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub heading: Heading,
    pub mode: MotionMode,
    pub color: u32,
}

/// Seedable source of every random cat parameter.
///
/// All sampling goes through one `fastrand::Rng`, so a fixed seed replays
/// the exact same sizes, headings and bounces.
pub struct CatDice {
    rng: fastrand::Rng,
}

impl CatDice {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Weighted size: mostly `[size_min, size_typical_max)`, sometimes up to
    /// `size_large_max`, rarely up to the larger viewport dimension.
    pub fn size(&mut self, config: &SimConfig, viewport: &Viewport) -> f32 {
        let roll = self.rng.f32();
        let giant_max = viewport.width.max(viewport.height).max(config.size_large_max);
        let (lo, hi) = if roll < config.giant_chance {
            (config.size_large_max, giant_max)
        } else if roll < config.giant_chance + config.large_chance {
            (config.size_typical_max, config.size_large_max)
        } else {
            (config.size_min, config.size_typical_max)
        };
        lo + self.rng.f32() * (hi - lo)
    }

    pub fn heading(&mut self) -> Heading {
        Heading::ALL[self.rng.usize(0..Heading::ALL.len())]
    }

    /// Pick a new heading after touching `touched`, never the current one.
    ///
    /// Preferred: headings moving away from every touched edge. In a corner
    /// that is a single diagonal, and if the cat already travels along it the
    /// pick widens to headings that leave at least one edge and enter none
    /// (for SE in the top-left corner: E or S).
    pub fn bounce_heading(&mut self, current: Heading, touched: &[Edge]) -> Heading {
        let strict = |h: Heading| touched.iter().all(|&e| h.points_away_from(e));
        let relaxed = |h: Heading| {
            touched.iter().all(|&e| !h.points_into(e))
                && touched.iter().any(|&e| h.points_away_from(e))
        };
        self.pick_heading(current, strict)
            .or_else(|| self.pick_heading(current, relaxed))
            // Opposite edges at once: anything but the current heading.
            .or_else(|| self.pick_heading(current, |_| true))
            .unwrap_or(current)
    }

    /// Uniform pick among headings other than `current` that satisfy `keep`.
    fn pick_heading(&mut self, current: Heading, keep: impl Fn(Heading) -> bool) -> Option<Heading> {
        let mut candidates = [Heading::N; 8];
        let mut n = 0;
        for heading in Heading::ALL {
            if heading != current && keep(heading) {
                candidates[n] = heading;
                n += 1;
            }
        }
        (n > 0).then(|| candidates[self.rng.usize(0..n)])
    }

    /// Off-screen start for `heading`: trailing side on moving axes, inside
    /// the envelope on a still axis.
    pub fn entry_point(
        &mut self,
        heading: Heading,
        size: f32,
        viewport: &Viewport,
        config: &SimConfig,
    ) -> Vec2 {
        let (dx, dy) = heading.step();
        let (lo, hi) = viewport.envelope(size);
        let offset = size * 0.5 + config.entry_margin;
        let x = match dx {
            1 => -offset,
            -1 => viewport.width + offset,
            _ => lo.x + self.rng.f32() * (hi.x - lo.x),
        };
        let y = match dy {
            1 => -offset,
            -1 => viewport.height + offset,
            _ => lo.y + self.rng.f32() * (hi.y - lo.y),
        };
        Vec2::new(x, y)
    }

    pub fn color(&mut self) -> u32 {
        random_cat_color(&mut self.rng)
    }

    pub fn unit(&mut self) -> f32 {
        self.rng.f32()
    }

    /// A fresh cat entering from off-screen.
    pub fn entering_cat(&mut self, config: &SimConfig, viewport: &Viewport) -> CatSpec {
        let size = self.size(config, viewport);
        let heading = self.heading();
        CatSpec {
            pos: self.entry_point(heading, size, viewport, config),
            size,
            speed: speed_for_size(size, config),
            heading,
            mode: MotionMode::Entering,
            color: self.color(),
        }
    }

    pub(crate) fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }
}

impl Default for CatDice {
    fn default() -> Self {
        Self::new()
    }
}

/// Smaller cats run faster; huge ones still crawl along at `min_speed`.
pub fn speed_for_size(size: f32, config: &SimConfig) -> f32 {
    (config.base_speed * config.reference_size / size.max(1.0)).max(config.min_speed)
}

/// Insert a cat into the world.
pub fn spawn_cat(world: &mut hecs::World, id: CatId, spec: CatSpec, dance: AnimationState) -> hecs::Entity {
    world.spawn((
        id,
        Position(spec.pos),
        PrevPosition(spec.pos),
        Motion {
            speed: spec.speed,
            heading: spec.heading,
            mode: spec.mode,
        },
        Appearance {
            size: spec.size,
            color: spec.color,
        },
        dance,
    ))
}

/// Generate a random cat-ish color (warm tones, grays, blacks, whites).
fn random_cat_color(rng: &mut fastrand::Rng) -> u32 {
    let palette: &[[u8; 3]] = &[
        [255, 165, 50],  // orange tabby
        [80, 80, 80],    // gray
        [30, 30, 30],    // black
        [240, 240, 235], // white
        [180, 130, 70],  // brown
        [255, 200, 150], // cream
        [100, 100, 110], // blue-gray
        [200, 100, 50],  // ginger
    ];
    let [r, g, b] = palette[rng.usize(0..palette.len())];
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | 0xFF
}
