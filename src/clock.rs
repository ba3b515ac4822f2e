use crate::config::SimConfig;
use crate::viewport::Viewport;

/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;

/// Fixed-interval timer driven by frame deltas.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: f64,
    accumulator: f64,
}

impl Cadence {
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(1e-4),
            accumulator: 0.0,
        }
    }

    /// Feed `dt` seconds; returns how many intervals elapsed.
    pub fn advance(&mut self, dt: f64) -> u32 {
        self.accumulator = (self.accumulator + dt.max(0.0)).min(self.interval.max(MAX_ACCUMULATOR));
        let mut fired = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            fired += 1;
        }
        fired
    }

    /// Interpolation alpha for rendering between fires.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.interval) as f32
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: f64) {
        self.interval = interval.max(1e-4);
        self.accumulator = self.accumulator.min(self.interval);
    }
}

/// Work due this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub motion_ticks: u32,
    pub collision_checks: u32,
}

/// The two periodic timers of cat mode: per-tick motion and the coarser
/// collision pass. Dropping the schedule stops both.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub motion: Cadence,
    pub collision: Cadence,
}

impl Schedule {
    pub fn for_viewport(viewport: &Viewport, config: &SimConfig) -> Self {
        Self {
            motion: Cadence::new(viewport.tick_interval(config)),
            collision: Cadence::new(viewport.collision_interval(config)),
        }
    }

    /// Follow a viewport change (the device class may have flipped).
    pub fn retune(&mut self, viewport: &Viewport, config: &SimConfig) {
        self.motion.set_interval(viewport.tick_interval(config));
        self.collision.set_interval(viewport.collision_interval(config));
    }

    pub fn advance(&mut self, dt: f64) -> Due {
        Due {
            motion_ticks: self.motion.advance(dt),
            collision_checks: self.collision.advance(dt),
        }
    }
}
