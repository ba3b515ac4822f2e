use instant::Instant;

/// Which part of a host frame is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FramePhase {
    Simulation = 0,
    BuildInstances = 1,
    Hud = 2,
    GpuUpload = 3,
    RenderSubmit = 4,
}

impl FramePhase {
    pub const ALL: [FramePhase; 5] = [
        Self::Simulation,
        Self::BuildInstances,
        Self::Hud,
        Self::GpuUpload,
        Self::RenderSubmit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Simulation => "Simulation",
            Self::BuildInstances => "Build Inst.",
            Self::Hud => "HUD",
            Self::GpuUpload => "GPU Upload",
            Self::RenderSubmit => "Render",
        }
    }
}

/// Per-phase timing with exponential moving average smoothing.
pub struct PhaseTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 5],
    /// Timestamp when `begin()` was called.
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl PhaseTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 5],
            start: Instant::now(),
        }
    }

    /// Call before a phase runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a phase finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: FramePhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        self.record(phase, elapsed_us);
    }

    fn record(&mut self, phase: FramePhase, elapsed_us: f64) {
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_moves_toward_samples() {
        let mut timers = PhaseTimers::new();
        for _ in 0..200 {
            timers.record(FramePhase::Hud, 100.0);
        }
        assert!((timers.durations_us[FramePhase::Hud as usize] - 100.0).abs() < 0.1);
        assert_eq!(timers.durations_us[FramePhase::Simulation as usize], 0.0);
        assert!((timers.total_us() - 100.0).abs() < 0.1);
    }
}
