/// Milestone phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Normal,
    /// Cats are hidden and confetti rains until `until` (simulation time).
    Celebrating { until: f64 },
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Normal => "Normal",
            Phase::Celebrating { .. } => "Celebrating",
        }
    }
}

/// What a state change means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    None,
    Started,
    Ended,
}

/// Counts resolved collisions and runs the celebration every `every` of them.
#[derive(Debug, Clone)]
pub struct Milestones {
    count: u32,
    every: u32,
    duration: f64,
    phase: Phase,
}

impl Milestones {
    pub fn new(every: u32, duration: f64) -> Self {
        Self {
            count: 0,
            every: every.max(1),
            duration,
            phase: Phase::Normal,
        }
    }

    /// Record one resolved collision at `now`.
    pub fn record(&mut self, now: f64) -> Milestone {
        self.count += 1;
        if self.count % self.every == 0 {
            self.phase = Phase::Celebrating {
                until: now + self.duration,
            };
            Milestone::Started
        } else {
            Milestone::None
        }
    }

    /// End the celebration once its window has passed.
    pub fn update(&mut self, now: f64) -> Milestone {
        match self.phase {
            Phase::Celebrating { until } if now >= until => {
                self.phase = Phase::Normal;
                Milestone::Ended
            }
            _ => Milestone::None,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.phase = Phase::Normal;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn celebrating(&self) -> bool {
        matches!(self.phase, Phase::Celebrating { .. })
    }

    /// Seconds of celebration left, 0 when not celebrating.
    pub fn remaining(&self, now: f64) -> f64 {
        match self.phase {
            Phase::Celebrating { until } => (until - now).max(0.0),
            Phase::Normal => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenth_collision_celebrates_for_seven_seconds() {
        let mut m = Milestones::new(10, 7.0);
        for i in 0..9 {
            assert_eq!(m.record(i as f64), Milestone::None);
            assert!(!m.celebrating());
        }
        assert_eq!(m.record(20.0), Milestone::Started);
        assert_eq!(m.count(), 10);
        assert_eq!(m.phase(), Phase::Celebrating { until: 27.0 });

        assert_eq!(m.update(26.9), Milestone::None);
        assert!(m.celebrating());
        assert_eq!(m.update(27.0), Milestone::Ended);
        assert_eq!(m.phase(), Phase::Normal);
        assert_eq!(m.update(28.0), Milestone::None);
    }

    #[test]
    fn celebrates_iff_positive_multiple() {
        let mut m = Milestones::new(10, 7.0);
        for n in 1..=35u32 {
            let started = m.record(0.0) == Milestone::Started;
            assert_eq!(started, n % 10 == 0, "count {n}");
            m.update(100.0);
        }
    }

    #[test]
    fn counter_only_moves_up_until_reset() {
        let mut m = Milestones::new(10, 7.0);
        let mut last = 0;
        for _ in 0..25 {
            m.record(0.0);
            assert!(m.count() > last);
            last = m.count();
        }
        m.reset();
        assert_eq!(m.count(), 0);
        assert!(!m.celebrating());
    }
}
